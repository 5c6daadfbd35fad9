use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{jwt::JwtKeys, password, repo::UserStore, repo_types::User},
    error::{AppError, StoreError},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and user lookups over the identity store.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.jwt.clone())
    }
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let name = name.trim();
        let email = normalize_email(email);

        if !(3..=100).contains(&name.chars().count()) {
            return Err(AppError::invalid("name must be between 3 and 100 characters"));
        }
        if !is_valid_email(&email) {
            return Err(AppError::invalid("email"));
        }
        if password.len() < 6 {
            return Err(AppError::invalid("password must be at least 6 characters"));
        }

        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(AppError::from_store("user"))?
            .is_some()
        {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict("email already in use".into()));
        }

        let password_hash = password::hash(password).map_err(AppError::Internal)?;
        let now = OffsetDateTime::now_utc();
        let user = self
            .users
            .create(&User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email,
                password_hash,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => {
                    warn!("email registered concurrently");
                    AppError::Conflict("email already in use".into())
                }
                other => AppError::from_store("user")(other),
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Checks credentials and issues a bearer token. Unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let email = normalize_email(email);
        let Some(user) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(AppError::from_store("user"))?
        else {
            warn!(%email, "login unknown email");
            return Err(AppError::Unauthenticated);
        };

        let ok = password::verify(password, &user.password_hash).map_err(AppError::Internal)?;
        if !ok {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthenticated);
        }

        let token = self
            .keys
            .issue(user.id, &user.email, self.keys.default_hours)
            .map_err(AppError::Internal)?;
        info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        if id.is_nil() {
            return Err(AppError::invalid("user_id"));
        }
        self.users
            .find_by_id(id)
            .await
            .map_err(AppError::from_store("user"))?
            .ok_or(AppError::NotFound("user"))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::invalid("email"));
        }
        self.users
            .find_by_email(&email)
            .await
            .map_err(AppError::from_store("user"))?
            .ok_or(AppError::NotFound("user"))
    }
}
