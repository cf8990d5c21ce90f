//! Terminal front end for interactive chat sessions.
//!
//! - [`chat_loop`]: reads lines, dispatches them to [`crate::commands`] or
//!   submits them through [`crate::core::session::Session`].
//! - [`render`]: text formatting for turns, usage, cost and errors.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns the conversation and the provider call.

pub mod chat_loop;
pub mod render;
