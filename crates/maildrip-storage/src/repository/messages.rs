//! Message repository

use async_trait::async_trait;
use maildrip_common::types::{MessageId, OwnerId};
use maildrip_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{CreateMessage, Message};

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Get a message by ID
    async fn get(&self, id: MessageId) -> Result<Option<Message>>;

    /// List messages owned by a user
    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Message>>;

    /// Create a new message
    async fn create(&self, input: CreateMessage) -> Result<Message>;
}

/// Database message repository
pub struct DbMessageRepository {
    pool: DatabasePool,
}

impl DbMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for DbMessageRepository {
    async fn get(&self, id: MessageId) -> Result<Option<Message>> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn create(&self, input: CreateMessage) -> Result<Message> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, owner_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.owner_id)
        .bind(&input.title)
        .bind(&input.body)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}
