//! Pionier is a terminal chat client for OpenAI-compatible completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation store, the single provider call per
//!   prompt, personality handling, and cost accounting.
//! - [`ui`] renders turns and costs and runs the line-oriented chat loop.
//! - [`commands`] implements slash-command parsing and command execution used
//!   by the chat loop.
//! - [`auth`] resolves the API key from the environment, the system keyring,
//!   or a masked prompt.
//! - [`api`] defines the chat completion payloads exchanged with the provider.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which builds a [`core::session::Session`]
//! and hands it to [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
