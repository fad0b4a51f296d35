//! recall-ai: Chat-completion provider abstraction layer
//!
//! This crate provides the message and usage types shared by the agent and
//! a common interface over OpenAI-compatible chat-completion endpoints
//! (OpenAI and the Hugging Face router).

pub mod error;
pub mod models;
pub mod providers;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use providers::CompletionService;
pub use types::*;
