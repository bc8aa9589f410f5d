//! Error types for a single conversational turn.

use tabletalk_core::error::TabletalkError;
use tabletalk_llm::LlmError;

/// Errors that end a turn. None of them outlive the turn that raised them.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("could not generate a query: {0}")]
    Synthesis(String),
    #[error("refusing to run query containing {keyword}")]
    UnsafeQuery { keyword: String },
    #[error("query failed: {0}")]
    Execution(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::Synthesis(err.to_string())
    }
}

impl From<TabletalkError> for ChatError {
    fn from(err: TabletalkError) -> Self {
        ChatError::Execution(err.to_string())
    }
}
