//! Context-aware SQL synthesis.
//!
//! Builds a grounded prompt from the schema feed and the bounded history,
//! asks the completion service for a statement at temperature 0.0 and
//! extracts a single statement from the reply.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use tabletalk_core::config::ChatConfig;
use tabletalk_llm::{CompletionRequest, CompletionService, Message};

use crate::error::ChatError;
use crate::memory::BoundedLog;

/// Assistant text recorded for turns answered from the previous result.
pub const FOLLOW_UP_PLACEHOLDER: &str = "[Applied follow-up on previous result set]";

static ENCLOSING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_+-]*\s*(.*?)\s*```$").unwrap());

static FENCE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap());

static STATEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(?:\bWITH\s+(?:RECURSIVE\s+)?\w+\s+AS\s*\(|\b(?:SELECT|INSERT|UPDATE|DELETE)\b).*?;",
    )
    .unwrap()
});

#[derive(Deserialize)]
struct QueryEnvelope {
    query: String,
}

/// Translates utterances into SQL, remembering recent exchanges.
pub struct QuerySynthesizer<C> {
    service: C,
    dialect: String,
    exchanges: BoundedLog<(String, String)>,
    queries: BoundedLog<(String, String)>,
}

impl<C: CompletionService> QuerySynthesizer<C> {
    pub fn new(service: C, config: &ChatConfig, dialect: impl Into<String>) -> Self {
        Self {
            service,
            dialect: dialect.into(),
            exchanges: BoundedLog::new(config.history_exchanges),
            queries: BoundedLog::new(config.query_history),
        }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// (utterance, assistant text) pairs replayed to the model.
    pub fn exchanges(&self) -> &BoundedLog<(String, String)> {
        &self.exchanges
    }

    /// (utterance, query) pairs listed in the history message.
    pub fn queries(&self) -> &BoundedLog<(String, String)> {
        &self.queries
    }

    /// Produce one SQL statement for `utterance`.
    ///
    /// History is only updated when a statement was extracted.
    pub async fn synthesize(&mut self, utterance: &str, schema_text: &str) -> Result<String, ChatError> {
        let messages = self.build_messages(utterance, schema_text);
        debug!(messages = messages.len(), "Requesting query synthesis");
        let request = CompletionRequest::new(messages).with_temperature(0.0);

        let raw = self.service.complete(&request).await?;
        let query = extract_statement(&raw)
            .ok_or_else(|| ChatError::Synthesis("model reply contained no statement".to_string()))?;

        self.exchanges.push((utterance.to_string(), query.clone()));
        self.queries.push((utterance.to_string(), query.clone()));
        info!(query = %query, "Query synthesized");
        Ok(query)
    }

    /// Note a turn that was answered from the previous result, so the model
    /// sees the progression.
    pub fn record_follow_up(&mut self, utterance: &str) {
        self.exchanges
            .push((utterance.to_string(), FOLLOW_UP_PLACEHOLDER.to_string()));
    }

    /// Prompt messages, in order: instructions, schema, replayed exchanges,
    /// the recent query log (when non-empty) and the utterance.
    pub fn build_messages(&self, utterance: &str, schema_text: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(4 + self.exchanges.len() * 2);
        messages.push(Message::system(system_prompt(&self.dialect)));
        messages.push(Message::system(format!("Schema:\n{}", schema_text)));

        for (said, answered) in self.exchanges.iter() {
            messages.push(Message::user(said.as_str()));
            messages.push(Message::assistant(answered.as_str()));
        }

        if !self.queries.is_empty() {
            let log = self
                .queries
                .iter()
                .map(|(said, sql)| format!("User: {}\nSQL: {}", said, sql))
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(Message::system(format!(
                "Recent SQL history (use it to resolve pronouns and continuations):\n{}",
                log
            )));
        }

        messages.push(Message::user(utterance));
        messages
    }
}

fn system_prompt(dialect: &str) -> String {
    let names = if dialect.eq_ignore_ascii_case("mysql") {
        "CONCAT(first_name, ' ', last_name)"
    } else {
        "first_name || ' ' || last_name"
    };
    format!(
        "You translate questions into {dialect} SQL.\n\
         - Reply with exactly one SQL statement ending with a semicolon.\n\
         - Do not use Markdown or code fences.\n\
         - Resolve references such as \"them\", \"their\", \"same\", \"above\" and \"those\" from the conversation so far.\n\
         - When changing a previous query, keep its WHERE, JOIN, GROUP BY, ORDER BY and LIMIT clauses unless the user overrides them.\n\
         - \"names\" means {names} when those columns exist.\n\
         - Keep the SQL simple and valid for {dialect}."
    )
}

/// Pull a single statement out of a model reply.
///
/// Strips enclosing code fences, then prefers a `{"query": ...}` envelope,
/// then the first keyword-led statement up to its `;`, then the trimmed
/// text. Returns `None` when nothing is left.
pub fn extract_statement(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let text = match ENCLOSING_FENCE_RE.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => FENCE_MARKER_RE.replace_all(trimmed, "").trim().to_string(),
    };

    if text.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<QueryEnvelope>(&text) {
            let query = envelope.query.trim();
            if !query.is_empty() {
                return Some(query.to_string());
            }
        }
    }

    if let Some(m) = STATEMENT_RE.find(&text) {
        return Some(m.as_str().trim().to_string());
    }

    (!text.is_empty()).then_some(text)
}
