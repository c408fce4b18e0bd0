// src/database/history_repo.rs
use async_trait::async_trait;
use tracing::error;

use crate::database::DbPool;
use crate::error::{CallControlError, Result};
use crate::models::CallHistoryRecord;
use crate::traits::HistorySink;

/// Writes finished calls into `call_histories`.
pub struct PgHistorySink {
    db_pool: DbPool,
}

impl PgHistorySink {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl HistorySink for PgHistorySink {
    async fn record(&self, record: &CallHistoryRecord) -> Result<i64> {
        let client = self.db_pool.get().await.map_err(|e| {
            error!("❌ Failed to get DB connection: {}", e);
            CallControlError::Pool(e.to_string())
        })?;

        // `date_time` is a plain timestamp column holding UTC.
        let date_time = record.timestamp.naive_utc();

        let row = client
            .query_one(
                "INSERT INTO call_histories
                 (date_time, src, dst, duration, type, status, recorded_file,
                  linked_id, call_id, module, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
                 RETURNING id",
                &[
                    &date_time,
                    &record.source,
                    &record.destination,
                    &record.duration_seconds,
                    &record.direction,
                    &record.status.as_str(),
                    &record.recording_file,
                    &record.correlation_id,
                    &record.call_id,
                    &record.module,
                ],
            )
            .await
            .map_err(|e| {
                error!("❌ Failed to insert call history: {}", e);
                CallControlError::Database(e)
            })?;

        Ok(row.get(0))
    }
}
