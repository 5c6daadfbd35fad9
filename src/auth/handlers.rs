use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{EmailQuery, LoginRequest, LoginResponse, RegisterRequest, UserResponse},
        extractors::AuthUser,
        services::UserService,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(get_me))
        .route("/users/by-email", get(get_by_email))
        .route("/users/:id", get(get_by_id))
}

#[instrument(skip(users, payload))]
pub async fn register(
    State(users): State<UserService>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = users
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(users, payload))]
pub async fn login(
    State(users): State<UserService>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = users.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(users))]
pub async fn get_me(
    State(users): State<UserService>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = users.get_user(identity.user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users, _auth))]
pub async fn get_by_email(
    State(users): State<UserService>,
    _auth: AuthUser,
    Query(q): Query<EmailQuery>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users.get_user_by_email(&q.email).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(users, _auth))]
pub async fn get_by_id(
    State(users): State<UserService>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users.get_user(id).await?;
    Ok(Json(user.into()))
}
