use thiserror::Error;

/// Errors from the completion service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("API key not set: environment variable {0} is empty or missing")]
    MissingApiKey(String),

    #[error("Completion service returned no content")]
    EmptyResponse,

    #[error("Failed to decode completion response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LlmError::Status {
            code: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Completion service returned 429: rate limited");

        let err = LlmError::MissingApiKey("OPENAI_API_KEY".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
