//! Persistence sink abstraction
//!
//! The interactions and transactions tables live outside this service (feature
//! store, files, a remote API). Sinks receive rows in the published column
//! layout and own any retry policy of their own.

use crate::{
    error::AppResult,
    models::{InteractionEvent, TransactionRecord},
    services::tracker::TrackerState,
};

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;

/// Destination for interaction batches and live like transactions
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InteractionSink: Send + Sync {
    /// Insert a batch of interaction rows
    async fn insert_interactions(&self, rows: &[InteractionEvent]) -> AppResult<()>;

    /// Insert a single confirmed like
    async fn insert_transaction(&self, record: &TransactionRecord) -> AppResult<()>;

    /// Sink name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Pushes the session's interaction table to the sink, then clears it
///
/// The caller holds exclusive access to `state` for the whole call, so no other
/// in-process request observes a half-flushed table. On sink failure the table
/// is left as it was. Returns the number of rows inserted.
pub async fn flush_session(state: &mut TrackerState, sink: &dyn InteractionSink) -> AppResult<usize> {
    let rows = state.interaction_events();
    if rows.is_empty() {
        tracing::debug!(sink = sink.name(), "No interactions to flush");
        return Ok(0);
    }

    if let Err(e) = sink.insert_interactions(&rows).await {
        tracing::error!(sink = sink.name(), error = %e, rows = rows.len(), "Failed to insert interactions");
        return Err(e);
    }

    state.clear_interactions();
    tracing::info!(sink = sink.name(), rows = rows.len(), "Interactions inserted successfully");

    Ok(rows.len())
}
