use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    appointments::{
        repo::AppointmentStore,
        repo_types::{Appointment, AppointmentStatus},
    },
    auth::repo::UserStore,
    error::AppError,
    patch::{self, Patch},
    state::AppState,
};

/// Fields accepted when booking an appointment. Status is not an input.
#[derive(Debug, Clone, Default)]
pub struct NewAppointment {
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_description: String,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub notes: String,
    pub price: f64,
}

/// A partial update; `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub client_id: Patch<Uuid>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub service_description: Option<String>,
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_unset()
            && self.client_name.is_none()
            && self.client_email.is_none()
            && self.client_phone.is_none()
            && self.service_description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
            && self.notes.is_none()
            && self.price.is_none()
    }

    /// Writes the supplied fields onto `target`.
    fn merge_into(self, target: &mut Appointment) {
        self.client_id.apply_to(&mut target.client_id);
        patch::apply(self.client_name, &mut target.client_name);
        patch::apply(self.client_email, &mut target.client_email);
        patch::apply(self.client_phone, &mut target.client_phone);
        patch::apply(self.service_description, &mut target.service_description);
        patch::apply(self.start_time, &mut target.start_time);
        patch::apply(self.end_time, &mut target.end_time);
        patch::apply(self.status, &mut target.status);
        patch::apply(self.notes, &mut target.notes);
        patch::apply(self.price, &mut target.price);
    }
}

fn check_time_range(start: OffsetDateTime, end: OffsetDateTime) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::invalid("endTime must be after startTime"));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::invalid("price must be a non-negative amount"));
    }
    Ok(())
}

/// Appointment lifecycle, scoped to the owning professional.
#[derive(Clone)]
pub struct AppointmentEngine {
    appointments: Arc<dyn AppointmentStore>,
    users: Arc<dyn UserStore>,
}

impl FromRef<AppState> for AppointmentEngine {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.appointments.clone(), state.users.clone())
    }
}

impl AppointmentEngine {
    pub fn new(appointments: Arc<dyn AppointmentStore>, users: Arc<dyn UserStore>) -> Self {
        Self {
            appointments,
            users,
        }
    }

    pub async fn create(&self, owner_id: Uuid, input: NewAppointment) -> Result<Appointment, AppError> {
        if owner_id.is_nil() {
            return Err(AppError::invalid("user_id"));
        }
        let start_time = input.start_time.ok_or_else(|| AppError::invalid("startTime"))?;
        let end_time = input.end_time.ok_or_else(|| AppError::invalid("endTime"))?;
        check_time_range(start_time, end_time)?;
        check_price(input.price)?;

        if self
            .users
            .find_by_id(owner_id)
            .await
            .map_err(AppError::from_store("user"))?
            .is_none()
        {
            return Err(AppError::NotFound("user"));
        }

        let now = OffsetDateTime::now_utc();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: owner_id,
            client_id: input.client_id,
            client_name: input.client_name,
            client_email: input.client_email,
            client_phone: input.client_phone,
            service_description: input.service_description,
            start_time,
            end_time,
            status: AppointmentStatus::Pending,
            notes: input.notes,
            price: input.price,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .appointments
            .create(&appointment)
            .await
            .map_err(AppError::from_store("appointment"))?;
        info!(appointment_id = %created.id, user_id = %owner_id, "appointment created");
        Ok(created)
    }

    /// Fetches an appointment, failing unless `requesting_user` owns it.
    pub async fn get(&self, id: Uuid, requesting_user: Uuid) -> Result<Appointment, AppError> {
        let appointment = self
            .appointments
            .find_by_id(id)
            .await
            .map_err(AppError::from_store("appointment"))?
            .ok_or(AppError::NotFound("appointment"))?;

        if appointment.user_id != requesting_user {
            warn!(appointment_id = %id, user_id = %requesting_user, "appointment access denied");
            return Err(AppError::Forbidden("appointment"));
        }
        Ok(appointment)
    }

    pub async fn list(
        &self,
        requesting_user: Uuid,
        start_from: Option<OffsetDateTime>,
        end_until: Option<OffsetDateTime>,
    ) -> Result<Vec<Appointment>, AppError> {
        if requesting_user.is_nil() {
            return Err(AppError::invalid("user_id"));
        }
        self.appointments
            .find_by_owner(requesting_user, start_from, end_until)
            .await
            .map_err(AppError::from_store("appointment"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        requesting_user: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, AppError> {
        let existing = self.get(id, requesting_user).await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let mut merged = existing.clone();
        patch.merge_into(&mut merged);
        check_time_range(merged.start_time, merged.end_time)?;
        check_price(merged.price)?;

        if merged.status != existing.status && !existing.status.can_transition_to(merged.status) {
            // Direct status writes skip the lifecycle guard that cancel() enforces.
            warn!(
                appointment_id = %id,
                from = %existing.status,
                to = %merged.status,
                "status override outside the appointment lifecycle"
            );
        }

        let updated = self
            .appointments
            .update(&merged)
            .await
            .map_err(AppError::from_store("appointment"))?;
        info!(appointment_id = %id, "appointment updated");
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid, requesting_user: Uuid) -> Result<Appointment, AppError> {
        let mut appointment = self.get(id, requesting_user).await?;
        if !appointment.status.can_cancel() {
            return Err(AppError::InvalidStateTransition {
                current: appointment.status,
            });
        }

        appointment.status = AppointmentStatus::Cancelled;
        let cancelled = self
            .appointments
            .update(&appointment)
            .await
            .map_err(AppError::from_store("appointment"))?;
        info!(appointment_id = %id, "appointment cancelled");
        Ok(cancelled)
    }
}
