use tokio::sync::Mutex;

use crate::{
    error::AppResult,
    models::{InteractionEvent, TransactionRecord},
    services::sink::InteractionSink,
};

/// Keeps inserted rows in memory; used for dry runs and tests
#[derive(Default)]
pub struct MemorySink {
    interactions: Mutex<Vec<InteractionEvent>>,
    transactions: Mutex<Vec<TransactionRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn interactions(&self) -> Vec<InteractionEvent> {
        self.interactions.lock().await.clone()
    }

    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.transactions.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl InteractionSink for MemorySink {
    async fn insert_interactions(&self, rows: &[InteractionEvent]) -> AppResult<()> {
        self.interactions.lock().await.extend_from_slice(rows);
        Ok(())
    }

    async fn insert_transaction(&self, record: &TransactionRecord) -> AppResult<()> {
        self.transactions.lock().await.push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
