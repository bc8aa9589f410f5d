//! Turn orchestrator: central coordinator wiring resolver, synthesizer,
//! executor and memory.
//!
//! Every call to [`TurnOrchestrator::handle_turn`] ends with exactly one
//! [`Turn`] appended to memory, including failed turns.

use tracing::{info, warn};

use tabletalk_core::config::ChatConfig;
use tabletalk_core::frame::TabularFrame;
use tabletalk_llm::CompletionService;
use tabletalk_storage::DataStore;

use crate::error::ChatError;
use crate::executor::QueryExecutor;
use crate::followup::{FollowUpResolver, Resolution, Transform};
use crate::memory::{ConversationMemory, Turn};
use crate::synthesizer::QuerySynthesizer;

/// What happened to one utterance.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Answered from the previous result.
    FollowUp {
        transform: Transform,
        frame: TabularFrame,
    },
    /// Answered by a freshly synthesized query.
    Query { query: String, frame: TabularFrame },
    /// The turn failed; `query` is set when synthesis got that far.
    Failed {
        query: Option<String>,
        error: ChatError,
    },
}

impl TurnOutcome {
    pub fn frame(&self) -> Option<&TabularFrame> {
        match self {
            TurnOutcome::FollowUp { frame, .. } | TurnOutcome::Query { frame, .. } => Some(frame),
            TurnOutcome::Failed { .. } => None,
        }
    }
}

pub struct TurnOrchestrator<C, S> {
    resolver: FollowUpResolver,
    synthesizer: QuerySynthesizer<C>,
    executor: QueryExecutor<S>,
    memory: ConversationMemory,
    schema_text: String,
    max_message_length: usize,
}

impl<C: CompletionService, S: DataStore> TurnOrchestrator<C, S> {
    pub fn new(
        synthesizer: QuerySynthesizer<C>,
        executor: QueryExecutor<S>,
        schema_text: impl Into<String>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            resolver: FollowUpResolver::new(),
            synthesizer,
            executor,
            memory: ConversationMemory::new(config.memory_turns),
            schema_text: schema_text.into(),
            max_message_length: config.max_message_length,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn synthesizer(&self) -> &QuerySynthesizer<C> {
        &self.synthesizer
    }

    pub fn executor(&self) -> &QueryExecutor<S> {
        &self.executor
    }

    /// Process one utterance: follow-up first, otherwise synthesize and
    /// execute.
    pub async fn handle_turn(&mut self, utterance: &str) -> TurnOutcome {
        let utterance = utterance.trim();

        if let Err(error) = self.validate(utterance) {
            return self.fail(utterance, None, error);
        }

        if let Resolution::Applied { transform, frame } =
            self.resolver.resolve(utterance, self.memory.last_frame())
        {
            info!(transform = %transform, rows = frame.row_count(), "Answered from previous result");
            self.synthesizer.record_follow_up(utterance);
            self.memory.push(Turn {
                utterance: utterance.to_string(),
                query: None,
                frame: Some(frame.clone()),
            });
            return TurnOutcome::FollowUp { transform, frame };
        }

        let query = match self.synthesizer.synthesize(utterance, &self.schema_text).await {
            Ok(query) => query,
            Err(error) => return self.fail(utterance, None, error),
        };

        match self.executor.execute(&query) {
            Ok(frame) => {
                let frame = frame.with_name_column();
                self.memory.push(Turn {
                    utterance: utterance.to_string(),
                    query: Some(query.clone()),
                    frame: Some(frame.clone()),
                });
                TurnOutcome::Query { query, frame }
            }
            Err(error) => self.fail(utterance, Some(query), error),
        }
    }

    fn validate(&self, utterance: &str) -> Result<(), ChatError> {
        if utterance.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if utterance.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }
        Ok(())
    }

    fn fail(&mut self, utterance: &str, query: Option<String>, error: ChatError) -> TurnOutcome {
        warn!(error = %error, "Turn failed");
        self.memory.push(Turn {
            utterance: utterance.to_string(),
            query: query.clone(),
            frame: None,
        });
        TurnOutcome::Failed { query, error }
    }
}
