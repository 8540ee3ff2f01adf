//! Mailing repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maildrip_common::types::{ClientId, MailingId};
use maildrip_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{CreateMailing, Mailing};

/// Mailing repository trait
///
/// The conditional mutations (`claim_due`, `advance_schedule`,
/// `mark_completed`) return whether the row was actually updated. A `false`
/// means a concurrent writer changed the row first and the caller must not
/// proceed with a send for it.
#[async_trait]
pub trait MailingRepository: Send + Sync {
    /// List all mailings the dispatch engine should scan (created/started)
    async fn list_active(&self) -> Result<Vec<Mailing>>;

    /// Get a mailing by ID
    async fn get(&self, id: MailingId) -> Result<Option<Mailing>>;

    /// Create a new mailing in `created` status
    async fn create(&self, input: CreateMailing) -> Result<Mailing>;

    /// Attach a client as a recipient of a mailing
    async fn attach_client(&self, mailing_id: MailingId, client_id: ClientId) -> Result<()>;

    /// Mark a still-active mailing as completed
    async fn mark_completed(&self, id: MailingId) -> Result<bool>;

    /// Claim a due mailing for sending by moving it to `started`, guarded on
    /// the schedule the caller observed
    async fn claim_due(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
    ) -> Result<bool>;

    /// Advance the schedule after a send attempt, guarded on the schedule the
    /// caller observed
    async fn advance_schedule(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
        new_next_send_time: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Database mailing repository
pub struct DbMailingRepository {
    pool: DatabasePool,
}

impl DbMailingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MailingRepository for DbMailingRepository {
    async fn list_active(&self) -> Result<Vec<Mailing>> {
        sqlx::query_as::<_, Mailing>(
            r#"
            SELECT * FROM mailings
            WHERE status IN ('created', 'started')
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: MailingId) -> Result<Option<Mailing>> {
        sqlx::query_as::<_, Mailing>("SELECT * FROM mailings WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn create(&self, input: CreateMailing) -> Result<Mailing> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Mailing>(
            r#"
            INSERT INTO mailings (
                id, owner_id, message_id, status, periodicity,
                start_date, end_date, next_send_time
            )
            VALUES ($1, $2, $3, 'created', $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.owner_id)
        .bind(input.message_id)
        .bind(input.periodicity.as_str())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.next_send_time)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn attach_client(&self, mailing_id: MailingId, client_id: ClientId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO mailing_clients (mailing_id, client_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(mailing_id)
        .bind(client_id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn mark_completed(&self, id: MailingId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mailings SET
                status = 'completed',
                updated_at = NOW()
            WHERE id = $1 AND status IN ('created', 'started')
            "#,
        )
        .bind(id)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_due(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mailings SET
                status = 'started',
                updated_at = NOW()
            WHERE id = $1
              AND status IN ('created', 'started')
              AND next_send_time = $2
            "#,
        )
        .bind(id)
        .bind(expected_next_send_time)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn advance_schedule(
        &self,
        id: MailingId,
        expected_next_send_time: DateTime<Utc>,
        new_next_send_time: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE mailings SET
                next_send_time = $3,
                updated_at = NOW()
            WHERE id = $1 AND next_send_time = $2
            "#,
        )
        .bind(id)
        .bind(expected_next_send_time)
        .bind(new_next_send_time)
        .execute(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
