//! Client repository

use async_trait::async_trait;
use maildrip_common::types::{ClientId, MailingId, OwnerId};
use maildrip_common::{Error, Result};
use uuid::Uuid;

use crate::db::DatabasePool;
use crate::models::{Client, CreateClient};

/// Client repository trait
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Get a client by ID
    async fn get(&self, id: ClientId) -> Result<Option<Client>>;

    /// List clients owned by a user
    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Client>>;

    /// List the recipients of a mailing
    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<Client>>;

    /// Create a new client
    async fn create(&self, input: CreateClient) -> Result<Client>;
}

/// Database client repository
pub struct DbClientRepository {
    pool: DatabasePool,
}

impl DbClientRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for DbClientRepository {
    async fn get(&self, id: ClientId) -> Result<Option<Client>> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Client>> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE owner_id = $1 ORDER BY email")
            .bind(owner_id)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_for_mailing(&self, mailing_id: MailingId) -> Result<Vec<Client>> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT c.* FROM clients c
            JOIN mailing_clients mc ON mc.client_id = c.id
            WHERE mc.mailing_id = $1
            ORDER BY c.email
            "#,
        )
        .bind(mailing_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn create(&self, input: CreateClient) -> Result<Client> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, owner_id, email, full_name, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.owner_id)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(&input.comment)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}
