use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::{
    error::{AppError, AppResult},
    models::{InteractionEvent, TransactionRecord},
    services::sink::InteractionSink,
};

const INTERACTIONS_FILE: &str = "interactions.jsonl";
const TRANSACTIONS_FILE: &str = "transactions.jsonl";

/// Appends rows as JSON lines under a directory, one file per table
pub struct JsonLinesSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn interactions_path(&self) -> PathBuf {
        self.dir.join(INTERACTIONS_FILE)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.dir.join(TRANSACTIONS_FILE)
    }

    async fn append<T: Serialize>(&self, path: &Path, rows: &[T]) -> AppResult<()> {
        let mut buf = String::new();
        for row in rows {
            buf.push_str(&serde_json::to_string(row)?);
            buf.push('\n');
        }

        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| sink_error(&self.dir, e))?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| sink_error(path, e))?;

        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| sink_error(path, e))?;
        file.flush().await.map_err(|e| sink_error(path, e))?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "Appended rows");

        Ok(())
    }
}

fn sink_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::Sink(format!("{}: {}", path.display(), e))
}

#[async_trait::async_trait]
impl InteractionSink for JsonLinesSink {
    async fn insert_interactions(&self, rows: &[InteractionEvent]) -> AppResult<()> {
        self.append(&self.interactions_path(), rows).await
    }

    async fn insert_transaction(&self, record: &TransactionRecord) -> AppResult<()> {
        self.append(&self.transactions_path(), std::slice::from_ref(record))
            .await
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}
