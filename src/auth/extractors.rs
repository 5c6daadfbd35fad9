use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::debug;

use super::{claims::Identity, jwt::JwtKeys};
use crate::error::AppError;

/// Resolves an `Authorization` header value into the calling identity.
///
/// Missing headers, unsupported schemes, bad signatures and expired tokens
/// all come back as the same `Unauthenticated` error.
pub fn resolve(keys: &JwtKeys, header: Option<&str>) -> Result<Identity, AppError> {
    let Some(header) = header else {
        debug!("missing Authorization header");
        return Err(AppError::Unauthenticated);
    };

    let mut fields = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (fields.next(), fields.next(), fields.next()) else {
        debug!("malformed Authorization header");
        return Err(AppError::Unauthenticated);
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        debug!(%scheme, "unsupported auth scheme");
        return Err(AppError::Unauthenticated);
    }

    match keys.validate(token) {
        Ok(claims) => Ok(Identity {
            user_id: claims.sub,
        }),
        Err(e) => {
            debug!(error = %e, "token rejected");
            Err(AppError::Unauthenticated)
        }
    }
}

/// Extracts and validates the bearer token, yielding the requesting user.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        resolve(&keys, header).map(AuthUser)
    }
}
