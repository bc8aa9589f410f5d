//! Tabletalk LLM crate - chat-completion types, the `CompletionService`
//! seam and an OpenAI-compatible HTTP client.
//!
//! Enable the `mock` feature for [`mock::ScriptedCompletion`], a
//! deterministic service for tests.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

pub use client::{CompletionService, OpenAiClient};
pub use error::LlmError;
pub use types::{CompletionRequest, Message, Role};
