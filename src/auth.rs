use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{SecondsFormat, TimeDelta, Utc};
use sqlx::SqlitePool;
use tracing::error;
use uuid::Uuid;

use crate::db::{self, accounts};
use crate::error::AppError;
use crate::state::AppState;

/// Argon2id digest in PHC string form; the salt travels inside it.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(|e| {
        error!("Failed to encode password salt: {e}");
        AppError::InternalServerError
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {e}");
            AppError::InternalServerError
        })
}

/// False for a wrong password and for a stored value that is not a PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Stores a fresh bearer token for the user and returns it.
pub async fn issue_session(db: &SqlitePool, user_id: &str, ttl_hours: i64) -> Result<String, AppError> {
    let token = Uuid::new_v4().simple().to_string();
    let ttl = TimeDelta::try_hours(ttl_hours).ok_or(AppError::InternalServerError)?;
    let expires_at = (Utc::now() + ttl).to_rfc3339_opts(SecondsFormat::Micros, true);

    accounts::insert_session(db, &token, user_id, &expires_at).await?;
    Ok(token)
}

/// The caller behind a valid `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let user_id = accounts::find_session_user(&state.db, &token, &db::now())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".to_string()))?;

        Ok(AuthUser { user_id })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_argon2_strings() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
        assert!(!verify_password("hunter3", &a));
    }

    #[test]
    fn unparseable_stored_hash_never_verifies() {
        assert!(!verify_password("hunter2", ""));
        assert!(!verify_password("hunter2", "5f4dcc3b5aa765d61d8327deb882cf99"));
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).as_deref(), Some("abc123"));

        parts
            .headers
            .insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&parts), None);
    }
}
