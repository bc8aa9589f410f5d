//! Gated query execution.

use tracing::{info, warn};

use tabletalk_core::frame::TabularFrame;
use tabletalk_core::safety::{GateDecision, QueryGate};
use tabletalk_storage::DataStore;

use crate::error::ChatError;

/// Runs statements that pass the denylist gate and materializes the rows.
pub struct QueryExecutor<S> {
    store: S,
    gate: QueryGate,
}

impl<S: DataStore> QueryExecutor<S> {
    pub fn new(store: S, gate: QueryGate) -> Self {
        Self { store, gate }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute `query`. Denied statements never reach the store.
    pub fn execute(&self, query: &str) -> Result<TabularFrame, ChatError> {
        if let GateDecision::Deny { keyword } = self.gate.check(query) {
            warn!(keyword = %keyword, query = %query, "Blocked unsafe query");
            return Err(ChatError::UnsafeQuery { keyword });
        }

        let frame = self.store.fetch(query)?.into_frame()?;
        info!(
            rows = frame.row_count(),
            columns = frame.column_count(),
            "Query executed"
        );
        Ok(frame)
    }
}
