use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::services::is_valid_email,
    clients::{
        repo_types::Client,
        services::{ClientPatch, NewClient},
    },
    error::AppError,
};

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Client> for ClientResponse {
    fn from(c: Client) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

fn check_name(name: &str) -> Result<(), AppError> {
    if name.trim().chars().count() < 2 {
        return Err(AppError::invalid("name must have at least 2 characters"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), AppError> {
    if !email.is_empty() && !is_valid_email(email) {
        return Err(AppError::invalid("email"));
    }
    Ok(())
}

impl TryFrom<CreateClientRequest> for NewClient {
    type Error = AppError;

    fn try_from(req: CreateClientRequest) -> Result<Self, Self::Error> {
        check_name(&req.name)?;
        check_email(&req.email)?;
        Ok(NewClient {
            name: req.name,
            email: req.email,
            phone: req.phone,
            notes: req.notes,
        })
    }
}

impl TryFrom<UpdateClientRequest> for ClientPatch {
    type Error = AppError;

    fn try_from(req: UpdateClientRequest) -> Result<Self, Self::Error> {
        if let Some(name) = &req.name {
            check_name(name)?;
        }
        if let Some(email) = &req.email {
            check_email(email)?;
        }
        Ok(ClientPatch {
            name: req.name,
            email: req.email,
            phone: req.phone,
            notes: req.notes,
        })
    }
}
