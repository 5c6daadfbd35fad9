use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::clients::repo_types::Client;
use crate::error::StoreError;

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create(&self, client: &Client) -> Result<Client, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError>;
    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError>;
    async fn update(&self, client: &Client) -> Result<Client, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

const CLIENT_COLUMNS: &str = "id, user_id, name, email, phone, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PgClientStore {
    db: PgPool,
}

impl PgClientStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn create(&self, c: &Client) -> Result<Client, StoreError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients ({CLIENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(c.id)
        .bind(c.user_id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.notes)
        .bind(c.created_at)
        .bind(c.updated_at)
        .fetch_one(&self.db)
        .await
        .context("insert client")?;
        Ok(client)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select client by id")?;
        Ok(client)
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            r#"
            SELECT {CLIENT_COLUMNS} FROM clients
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY name ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("select clients by owner")?;
        Ok(clients)
    }

    async fn update(&self, c: &Client) -> Result<Client, StoreError> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = $2, email = $3, phone = $4, notes = $5, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(&c.notes)
        .fetch_optional(&self.db)
        .await
        .context("update client")?;
        client.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        // Logical removal; appointments keep their weak client_id reference.
        let res = sqlx::query(
            "UPDATE clients SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("delete client")?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
