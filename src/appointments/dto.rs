use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    appointments::{
        repo_types::{Appointment, AppointmentStatus},
        services::{AppointmentPatch, NewAppointment},
    },
    auth::services::is_valid_email,
    error::AppError,
    patch::Patch,
};

/// `POST /appointments`. The owner comes from the token; a `status` key, if sent, is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub service_description: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub price: f64,
}

/// `PUT /appointments/:id`. Absent or null fields are left untouched;
/// `clientId: ""` removes the client link.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub service_description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub status: AppointmentStatus,
    pub notes: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            client_id: a.client_id,
            client_name: a.client_name,
            client_email: a.client_email,
            client_phone: a.client_phone,
            service_description: a.service_description,
            start_time: a.start_time,
            end_time: a.end_time,
            status: a.status,
            notes: a.notes,
            price: a.price,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

fn parse_client_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::invalid("clientId must be a UUID or empty"))
}

fn check_client_email(email: &str) -> Result<(), AppError> {
    if !email.is_empty() && !is_valid_email(email) {
        return Err(AppError::invalid("clientEmail"));
    }
    Ok(())
}

impl TryFrom<CreateAppointmentRequest> for NewAppointment {
    type Error = AppError;

    fn try_from(req: CreateAppointmentRequest) -> Result<Self, Self::Error> {
        let client_id = match req.client_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_client_id(raw)?),
        };
        if client_id.is_none() && req.client_name.trim().chars().count() < 2 {
            return Err(AppError::invalid("clientName is required when clientId is absent"));
        }
        check_client_email(&req.client_email)?;
        if req.service_description.trim().is_empty() {
            return Err(AppError::invalid("serviceDescription"));
        }

        Ok(NewAppointment {
            client_id,
            client_name: req.client_name,
            client_email: req.client_email,
            client_phone: req.client_phone,
            service_description: req.service_description,
            start_time: req.start_time,
            end_time: req.end_time,
            notes: req.notes,
            price: req.price,
        })
    }
}

impl TryFrom<UpdateAppointmentRequest> for AppointmentPatch {
    type Error = AppError;

    fn try_from(req: UpdateAppointmentRequest) -> Result<Self, Self::Error> {
        let client_id = match req.client_id.as_deref().map(str::trim) {
            None => Patch::Unset,
            Some("") => Patch::Clear,
            Some(raw) => Patch::Set(parse_client_id(raw)?),
        };
        if let Some(email) = &req.client_email {
            check_client_email(email)?;
        }
        if matches!(&req.service_description, Some(s) if s.trim().is_empty()) {
            return Err(AppError::invalid("serviceDescription"));
        }
        let status = req
            .status
            .as_deref()
            .map(str::parse::<AppointmentStatus>)
            .transpose()
            .map_err(|e| AppError::invalid(format!("status: {e}")))?;

        Ok(AppointmentPatch {
            client_id,
            client_name: req.client_name,
            client_email: req.client_email,
            client_phone: req.client_phone,
            service_description: req.service_description,
            start_time: req.start_time,
            end_time: req.end_time,
            status,
            notes: req.notes,
            price: req.price,
        })
    }
}
