pub mod config;
pub mod conversation;
pub mod keyring;
pub mod message;
pub mod orchestrator;
pub mod personality;
pub mod pricing;
pub mod provider;
pub mod provider_slot;
pub mod session;
