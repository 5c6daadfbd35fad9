use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Signing and verification keys for bearer tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    pub default_hours: i64,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            default_hours: cfg.expiration_hours,
        }
    }

    /// Issues a token for `user_id` that stays valid for `hours_valid` hours.
    pub fn issue(&self, user_id: Uuid, email: &str, hours_valid: i64) -> anyhow::Result<String> {
        if user_id.is_nil() {
            anyhow::bail!("cannot issue a token for a nil user id");
        }
        if hours_valid <= 0 {
            anyhow::bail!("token lifetime must be positive");
        }
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::hours(hours_valid);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, hours_valid, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.sub.is_nil() {
            anyhow::bail!("token subject is nil");
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }

    #[cfg(test)]
    pub(crate) fn encode_claims(&self, claims: &Claims) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).expect("encode claims")
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: secret.into(),
        issuer: issuer.into(),
        audience: audience.into(),
        expiration_hours: 72,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_validate_token() {
        let keys = test_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "ana@example.com", 1).expect("issue");
        let claims = keys.validate(&token).expect("validate");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn issue_rejects_nil_user_and_bad_lifetime() {
        let keys = test_keys("dev-secret", "iss", "aud");
        assert!(keys.issue(Uuid::nil(), "a@b.co", 1).is_err());
        assert!(keys.issue(Uuid::new_v4(), "a@b.co", 0).is_err());
    }

    #[test]
    fn validate_rejects_wrong_secret() {
        let good = test_keys("secret-a", "iss", "aud");
        let bad = test_keys("secret-b", "iss", "aud");
        let token = good.issue(Uuid::new_v4(), "a@b.co", 1).expect("issue");
        assert!(bad.validate(&token).is_err());
    }

    #[test]
    fn validate_rejects_wrong_issuer_or_audience() {
        let good = test_keys("same-secret", "good-iss", "good-aud");
        let bad = test_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), "a@b.co", 1).expect("issue");
        assert!(bad.validate(&token).is_err());
    }

    #[test]
    fn validate_rejects_expired_token() {
        let keys = test_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.encode_claims(&Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".into(),
            iat: (past - TimeDuration::hours(1)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        });
        assert!(keys.validate(&token).is_err());
    }

    #[test]
    fn validate_rejects_token_expired_seconds_ago() {
        let keys = test_keys("dev-secret", "iss", "aud");
        let now = OffsetDateTime::now_utc();
        let token = keys.encode_claims(&Claims {
            sub: Uuid::new_v4(),
            email: "a@b.co".into(),
            iat: (now - TimeDuration::minutes(10)).unix_timestamp() as usize,
            exp: (now - TimeDuration::seconds(30)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        });
        assert!(keys.validate(&token).is_err());
    }

    #[test]
    fn validate_rejects_garbage() {
        let keys = test_keys("dev-secret", "iss", "aud");
        assert!(keys.validate("not.a.token").is_err());
        assert!(keys.validate("").is_err());
    }
}
