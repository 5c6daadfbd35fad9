use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    clients::{
        dto::{ClientResponse, CreateClientRequest, UpdateClientRequest},
        services::ClientRegistry,
    },
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

#[instrument(skip(registry, body))]
pub async fn create_client(
    State(registry): State<ClientRegistry>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), AppError> {
    let client = registry.create(identity.user_id, body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

#[instrument(skip(registry))]
pub async fn list_clients(
    State(registry): State<ClientRegistry>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let clients = registry.list(identity.user_id).await?;
    Ok(Json(clients.into_iter().map(ClientResponse::from).collect()))
}

#[instrument(skip(registry))]
pub async fn get_client(
    State(registry): State<ClientRegistry>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientResponse>, AppError> {
    let client = registry.get(id, identity.user_id).await?;
    Ok(Json(client.into()))
}

#[instrument(skip(registry, body))]
pub async fn update_client(
    State(registry): State<ClientRegistry>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let client = registry.update(id, identity.user_id, body.try_into()?).await?;
    Ok(Json(client.into()))
}

#[instrument(skip(registry))]
pub async fn delete_client(
    State(registry): State<ClientRegistry>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    registry.delete(id, identity.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
