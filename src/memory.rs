//! In-memory stores backing unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    appointments::{repo::AppointmentStore, repo_types::Appointment},
    auth::{repo::UserStore, repo_types::User},
    clients::{repo::ClientStore, repo_types::Client},
    error::StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    clients: RwLock<HashMap<Uuid, Client>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    appointment_creates: AtomicUsize,
    appointment_updates: AtomicUsize,
    client_updates: AtomicUsize,
    vanish_on_next_update: AtomicBool,
    backend_down_on_next_write: AtomicBool,
}

impl MemoryStore {
    pub async fn seed_user(&self, email: &str) -> Uuid {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: "Seeded User".into(),
            email: email.into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        self.users.write().await.insert(id, user);
        id
    }

    pub fn appointment_creates(&self) -> usize {
        self.appointment_creates.load(Ordering::SeqCst)
    }

    pub fn appointment_updates(&self) -> usize {
        self.appointment_updates.load(Ordering::SeqCst)
    }

    pub fn client_updates(&self) -> usize {
        self.client_updates.load(Ordering::SeqCst)
    }

    /// Makes the next appointment update behave as if the row was deleted concurrently.
    pub fn fail_next_update_with_missing_row(&self) {
        self.vanish_on_next_update.store(true, Ordering::SeqCst);
    }

    /// Makes the next appointment create or update fail with a backend error.
    pub fn fail_next_write_with_backend_error(&self) {
        self.backend_down_on_next_write.store(true, Ordering::SeqCst);
    }

    fn backend_check(&self) -> Result<(), StoreError> {
        if self.backend_down_on_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn create(&self, client: &Client) -> Result<Client, StoreError> {
        self.clients.write().await.insert(client.id, client.clone());
        Ok(client.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.read().await.get(&id).cloned())
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError> {
        let mut out: Vec<Client> = self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn update(&self, client: &Client) -> Result<Client, StoreError> {
        self.client_updates.fetch_add(1, Ordering::SeqCst);
        let mut clients = self.clients.write().await;
        let stored = clients.get_mut(&client.id).ok_or(StoreError::NotFound)?;
        *stored = Client {
            user_id: stored.user_id,
            created_at: stored.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..client.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.clients
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        self.appointment_creates.fetch_add(1, Ordering::SeqCst);
        self.backend_check()?;
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn find_by_owner(
        &self,
        user_id: Uuid,
        start_from: Option<OffsetDateTime>,
        end_until: Option<OffsetDateTime>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut out: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .filter(|a| start_from.map_or(true, |s| a.start_time >= s))
            .filter(|a| end_until.map_or(true, |e| a.end_time <= e))
            .cloned()
            .collect();
        out.sort_by_key(|a| a.start_time);
        Ok(out)
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        self.appointment_updates.fetch_add(1, Ordering::SeqCst);
        self.backend_check()?;
        if self.vanish_on_next_update.swap(false, Ordering::SeqCst) {
            return Err(StoreError::NotFound);
        }
        let mut appointments = self.appointments.write().await;
        let stored = appointments
            .get_mut(&appointment.id)
            .ok_or(StoreError::NotFound)?;
        *stored = Appointment {
            user_id: stored.user_id,
            created_at: stored.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..appointment.clone()
        };
        Ok(stored.clone())
    }
}
