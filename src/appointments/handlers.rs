use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    appointments::{
        dto::{
            AppointmentResponse, CreateAppointmentRequest, ListAppointmentsQuery,
            UpdateAppointmentRequest,
        },
        services::AppointmentEngine,
    },
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route(
            "/appointments/:id",
            get(get_appointment).put(update_appointment),
        )
        .route("/appointments/:id/cancel", patch(cancel_appointment))
}

#[instrument(skip(engine, body))]
pub async fn create_appointment(
    State(engine): State<AppointmentEngine>,
    AuthUser(identity): AuthUser,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let created = engine.create(identity.user_id, body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[instrument(skip(engine))]
pub async fn list_appointments(
    State(engine): State<AppointmentEngine>,
    AuthUser(identity): AuthUser,
    Query(q): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let items = engine
        .list(identity.user_id, q.start_time, q.end_time)
        .await?
        .into_iter()
        .map(AppointmentResponse::from)
        .collect();
    Ok(Json(items))
}

#[instrument(skip(engine))]
pub async fn get_appointment(
    State(engine): State<AppointmentEngine>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = engine.get(id, identity.user_id).await?;
    Ok(Json(appointment.into()))
}

#[instrument(skip(engine, body))]
pub async fn update_appointment(
    State(engine): State<AppointmentEngine>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let updated = engine.update(id, identity.user_id, body.try_into()?).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip(engine))]
pub async fn cancel_appointment(
    State(engine): State<AppointmentEngine>,
    AuthUser(identity): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let cancelled = engine.cancel(id, identity.user_id).await?;
    Ok(Json(cancelled.into()))
}
