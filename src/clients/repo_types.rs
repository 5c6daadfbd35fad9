use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A client on a professional's roster.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid, // owning professional
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
