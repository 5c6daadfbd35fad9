use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clients::{repo::ClientStore, repo_types::Client},
    error::AppError,
    patch,
    state::AppState,
};

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.notes.is_none()
    }
}

#[derive(Clone)]
pub struct ClientRegistry {
    clients: Arc<dyn ClientStore>,
}

impl FromRef<AppState> for ClientRegistry {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.clients.clone())
    }
}

impl ClientRegistry {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    pub async fn create(&self, owner_id: Uuid, input: NewClient) -> Result<Client, AppError> {
        if owner_id.is_nil() {
            return Err(AppError::invalid("user_id"));
        }
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("name"));
        }

        let now = OffsetDateTime::now_utc();
        let client = self
            .clients
            .create(&Client {
                id: Uuid::new_v4(),
                user_id: owner_id,
                name: input.name,
                email: input.email,
                phone: input.phone,
                notes: input.notes,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(AppError::from_store("client"))?;
        info!(client_id = %client.id, user_id = %owner_id, "client created");
        Ok(client)
    }

    pub async fn get(&self, id: Uuid, requesting_user: Uuid) -> Result<Client, AppError> {
        let client = self
            .clients
            .find_by_id(id)
            .await
            .map_err(AppError::from_store("client"))?
            .ok_or(AppError::NotFound("client"))?;

        if client.user_id != requesting_user {
            warn!(client_id = %id, user_id = %requesting_user, "client access denied");
            return Err(AppError::Forbidden("client"));
        }
        Ok(client)
    }

    pub async fn list(&self, requesting_user: Uuid) -> Result<Vec<Client>, AppError> {
        if requesting_user.is_nil() {
            return Err(AppError::invalid("user_id"));
        }
        self.clients
            .find_by_owner(requesting_user)
            .await
            .map_err(AppError::from_store("client"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        requesting_user: Uuid,
        input: ClientPatch,
    ) -> Result<Client, AppError> {
        let mut client = self.get(id, requesting_user).await?;
        if input.is_empty() {
            return Ok(client);
        }
        if matches!(&input.name, Some(name) if name.trim().is_empty()) {
            return Err(AppError::invalid("name"));
        }

        patch::apply(input.name, &mut client.name);
        patch::apply(input.email, &mut client.email);
        patch::apply(input.phone, &mut client.phone);
        patch::apply(input.notes, &mut client.notes);

        let updated = self
            .clients
            .update(&client)
            .await
            .map_err(AppError::from_store("client"))?;
        info!(client_id = %id, "client updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, requesting_user: Uuid) -> Result<(), AppError> {
        self.get(id, requesting_user).await?;
        self.clients
            .delete(id)
            .await
            .map_err(AppError::from_store("client"))?;
        info!(client_id = %id, "client deleted");
        Ok(())
    }
}
