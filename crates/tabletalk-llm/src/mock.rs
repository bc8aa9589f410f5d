//! Deterministic [`CompletionService`] for tests that must not touch the
//! network.
//!
//! Queue replies with [`ScriptedCompletion::with_response`] and
//! [`ScriptedCompletion::with_error`]; they are handed out in FIFO order and
//! every request is recorded for later inspection.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::CompletionService;
use crate::error::LlmError;
use crate::types::CompletionRequest;

#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_response(&self, text: impl Into<String>) {
        self.lock_queue().push_back(Ok(text.into()));
    }

    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.enqueue_response(text);
        self
    }

    pub fn enqueue_error(&self, error: LlmError) {
        self.lock_queue().push_back(Err(error));
    }

    pub fn with_error(self, error: LlmError) -> Self {
        self.enqueue_error(error);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.lock_queue()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[tokio::test]
    async fn test_returns_responses_in_fifo_order() {
        let svc = ScriptedCompletion::new()
            .with_response("first")
            .with_error(LlmError::Decode("boom".to_string()))
            .with_response("second");
        let req = CompletionRequest::new(vec![Message::user("q")]);

        assert_eq!(svc.complete(&req).await.unwrap(), "first");
        assert!(matches!(svc.complete(&req).await, Err(LlmError::Decode(_))));
        assert_eq!(svc.complete(&req).await.unwrap(), "second");
        assert_eq!(svc.call_count(), 3);
    }

    #[tokio::test]
    async fn test_errors_when_queue_is_empty() {
        let svc = ScriptedCompletion::new();
        let req = CompletionRequest::new(vec![Message::user("q")]);
        assert!(matches!(svc.complete(&req).await, Err(LlmError::EmptyResponse)));
        assert_eq!(svc.requests()[0], req);
    }
}
