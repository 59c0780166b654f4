//! Execute a multi-batch provisioning script in one transaction.

use crate::error::ScriptExecutionError;
use sqlx::PgPool;
use std::time::Duration;

/// Line that ends a batch, matched case-insensitively after trimming.
pub const BATCH_SEPARATOR: &str = "GO";

/// Split `script` on separator lines. Whitespace-only batches are dropped; the
/// remaining batches keep their order and inner line breaks.
pub fn split_batches(script: &str) -> Vec<String> {
    let normalized = script.replace("\r\n", "\n");
    let mut batches = Vec::new();
    let mut current = String::new();
    for line in normalized.split('\n') {
        if line.trim().eq_ignore_ascii_case(BATCH_SEPARATOR) {
            push_batch(&mut batches, &mut current);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_batch(&mut batches, &mut current);
    batches
}

fn push_batch(batches: &mut Vec<String>, current: &mut String) {
    let batch = std::mem::take(current);
    let trimmed = batch.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}

#[derive(Clone)]
pub struct ScriptRunner {
    pool: PgPool,
    batch_timeout: Duration,
}

impl ScriptRunner {
    pub fn new(pool: PgPool, batch_timeout: Duration) -> Self {
        ScriptRunner { pool, batch_timeout }
    }

    /// Run every batch of `script` in order on a single transaction. Commits only when
    /// all batches succeed; otherwise rolls back and returns the failing batch's error.
    /// A script with only blank batches is a no-op.
    pub async fn execute(&self, script: &str) -> Result<(), ScriptExecutionError> {
        let batches = split_batches(script);
        if batches.is_empty() {
            tracing::debug!("provisioning script has no batches, nothing to run");
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ScriptExecutionError::Connect)?;

        let set_timeout = format!("SET LOCAL statement_timeout = {}", self.batch_timeout.as_millis());
        if let Err(e) = sqlx::query(&set_timeout).execute(&mut *tx).await {
            if let Err(rb) = tx.rollback().await {
                tracing::debug!(error = %rb, "rollback after setup failure");
            }
            return Err(ScriptExecutionError::Setup(e));
        }

        for (i, batch) in batches.iter().enumerate() {
            let index = i + 1;
            tracing::debug!(batch = index, total = batches.len(), "executing provisioning batch");
            // Unbound text goes over the simple-query protocol, so a batch may hold
            // several statements and `DO $$` blocks.
            if let Err(source) = sqlx::Executor::execute(&mut *tx, batch.as_str()).await {
                tracing::warn!(batch = index, error = %source, "provisioning batch failed, rolling back");
                if let Err(rb) = tx.rollback().await {
                    tracing::debug!(error = %rb, "rollback failed");
                }
                return Err(ScriptExecutionError::Batch { index, source });
            }
        }

        tx.commit().await.map_err(ScriptExecutionError::Commit)?;
        tracing::info!(batches = batches.len(), "provisioning script committed");
        Ok(())
    }
}
