//! Dispatch log repository
//!
//! Logs are append-only: one row per attempted send, never updated.

use async_trait::async_trait;
use maildrip_common::types::{LogStatus, MailingId};
use maildrip_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{CreateLog, DispatchLog};

/// Dispatch log repository trait
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Append a log entry for one send attempt
    async fn create(&self, input: CreateLog) -> Result<DispatchLog>;

    /// List log entries for a mailing, newest first
    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<DispatchLog>>;

    /// Count log entries for a mailing, optionally filtered by outcome
    async fn count_for_mailing(
        &self,
        mailing_id: MailingId,
        status: Option<LogStatus>,
    ) -> Result<i64>;
}

/// Database dispatch log repository
pub struct DbLogRepository {
    pool: DatabasePool,
}

impl DbLogRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogRepository for DbLogRepository {
    async fn create(&self, input: CreateLog) -> Result<DispatchLog> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, DispatchLog>(
            r#"
            INSERT INTO dispatch_logs (id, mailing_id, status, server_response)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.mailing_id)
        .bind(input.status.as_str())
        .bind(&input.server_response)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<DispatchLog>> {
        sqlx::query_as::<_, DispatchLog>(
            r#"
            SELECT * FROM dispatch_logs
            WHERE mailing_id = $1
            ORDER BY attempted_at DESC
            "#,
        )
        .bind(mailing_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn count_for_mailing(
        &self,
        mailing_id: MailingId,
        status: Option<LogStatus>,
    ) -> Result<i64> {
        let count: (i64,) = if let Some(status) = status {
            sqlx::query_as(
                "SELECT COUNT(*) FROM dispatch_logs WHERE mailing_id = $1 AND status = $2",
            )
            .bind(mailing_id)
            .bind(status.as_str())
            .fetch_one(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM dispatch_logs WHERE mailing_id = $1")
                .bind(mailing_id)
                .fetch_one(self.pool.pool())
                .await
                .map_err(|e| Error::Database(e.to_string()))?
        };
        Ok(count.0)
    }
}
