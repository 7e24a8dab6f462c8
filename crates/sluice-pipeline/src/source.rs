//! Record source capability and its PostgreSQL implementation.

use async_trait::async_trait;
use sluice_core::Record;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::error::Result;

/// Provider of the finite batch of source rows for one invocation.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches the pending batch; may be empty.
    async fn fetch_records(&self) -> Result<Vec<Record>>;
}

/// Record source backed by a PostgreSQL table.
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    /// Creates a source reading from the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn fetch_records(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(
            r"
            SELECT id, payload, recorded_at
            FROM data_records
            ORDER BY recorded_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| {
                Ok(Record {
                    id: row.try_get("id")?,
                    payload: row.try_get("payload")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(record_count = records.len(), "fetched source records");
        Ok(records)
    }
}
