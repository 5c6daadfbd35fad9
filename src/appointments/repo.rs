use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::appointments::repo_types::{Appointment, AppointmentRow};
use crate::error::StoreError;

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;
    /// Owner's appointments ordered by start time, optionally bounded by
    /// `start_time >= start_from` and `end_time <= end_until`.
    async fn find_by_owner(
        &self,
        user_id: Uuid,
        start_from: Option<OffsetDateTime>,
        end_until: Option<OffsetDateTime>,
    ) -> Result<Vec<Appointment>, StoreError>;
    /// Writes every mutable column and refreshes `updated_at`.
    async fn update(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;
}

const APPOINTMENT_COLUMNS: &str = "id, user_id, client_id, client_name, client_email, client_phone, \
     service_description, start_time, end_time, status, notes, price, created_at, updated_at";

fn into_entity(row: AppointmentRow) -> Result<Appointment, StoreError> {
    Appointment::try_from(row)
        .context("decode appointment row")
        .map_err(StoreError::Backend)
}

#[derive(Clone)]
pub struct PgAppointmentStore {
    db: PgPool,
}

impl PgAppointmentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn create(&self, a: &Appointment) -> Result<Appointment, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            INSERT INTO appointments ({APPOINTMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(a.id)
        .bind(a.user_id)
        .bind(a.client_id)
        .bind(&a.client_name)
        .bind(&a.client_email)
        .bind(&a.client_phone)
        .bind(&a.service_description)
        .bind(a.start_time)
        .bind(a.end_time)
        .bind(a.status.as_str())
        .bind(&a.notes)
        .bind(a.price)
        .bind(a.created_at)
        .bind(a.updated_at)
        .fetch_one(&self.db)
        .await
        .context("insert appointment")?;
        into_entity(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select appointment by id")?;
        row.map(into_entity).transpose()
    }

    async fn find_by_owner(
        &self,
        user_id: Uuid,
        start_from: Option<OffsetDateTime>,
        end_until: Option<OffsetDateTime>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE user_id = "
        ));
        qb.push_bind(user_id);
        if let Some(start) = start_from {
            qb.push(" AND start_time >= ").push_bind(start);
        }
        if let Some(end) = end_until {
            qb.push(" AND end_time <= ").push_bind(end);
        }
        qb.push(" ORDER BY start_time ASC");

        let rows = qb
            .build_query_as::<AppointmentRow>()
            .fetch_all(&self.db)
            .await
            .context("select appointments by owner")?;
        rows.into_iter().map(into_entity).collect()
    }

    async fn update(&self, a: &Appointment) -> Result<Appointment, StoreError> {
        // user_id and created_at are never written after insert.
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            UPDATE appointments
            SET client_id = $2, client_name = $3, client_email = $4, client_phone = $5,
                service_description = $6, start_time = $7, end_time = $8, status = $9,
                notes = $10, price = $11, updated_at = now()
            WHERE id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(a.id)
        .bind(a.client_id)
        .bind(&a.client_name)
        .bind(&a.client_email)
        .bind(&a.client_phone)
        .bind(&a.service_description)
        .bind(a.start_time)
        .bind(a.end_time)
        .bind(a.status.as_str())
        .bind(&a.notes)
        .bind(a.price)
        .fetch_optional(&self.db)
        .await
        .context("update appointment")?;
        match row {
            Some(row) => into_entity(row),
            None => Err(StoreError::NotFound),
        }
    }
}
