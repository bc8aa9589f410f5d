//! Denylist gate applied to every statement before it reaches the store.

use crate::config::SafetyConfig;

/// Keywords that are always denied.
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &["DROP", "DELETE", "ALTER", "TRUNCATE"];

/// Outcome of checking a statement against the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// The statement contains `keyword` as a case-insensitive substring.
    Deny { keyword: String },
}

/// Case-insensitive substring denylist.
///
/// Matching is a plain substring test on the upper-cased statement, so a
/// column such as `deleted_at` is also refused.
#[derive(Debug, Clone)]
pub struct QueryGate {
    denied: Vec<String>,
}

impl QueryGate {
    pub fn new(config: &SafetyConfig) -> Self {
        let mut denied: Vec<String> = DESTRUCTIVE_KEYWORDS.iter().map(|k| k.to_string()).collect();
        for extra in &config.extra_denied_keywords {
            let upper = extra.trim().to_uppercase();
            if !upper.is_empty() && !denied.contains(&upper) {
                denied.push(upper);
            }
        }
        Self { denied }
    }

    /// Check a statement. The first denied keyword found, in list order, is
    /// reported.
    pub fn check(&self, statement: &str) -> GateDecision {
        let upper = statement.to_uppercase();
        match self.denied.iter().find(|k| upper.contains(k.as_str())) {
            Some(keyword) => GateDecision::Deny {
                keyword: keyword.clone(),
            },
            None => GateDecision::Allow,
        }
    }

    pub fn is_safe(&self, statement: &str) -> bool {
        self.check(statement) == GateDecision::Allow
    }

    pub fn denied_keywords(&self) -> &[String] {
        &self.denied
    }
}

impl Default for QueryGate {
    fn default() -> Self {
        Self::new(&SafetyConfig::default())
    }
}
