use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Credentials, User};

pub async fn insert_user(
    db: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        created_at: super::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(password_hash)
    .bind(&user.created_at)
    .execute(db)
    .await
    .map_err(email_conflict)?;

    Ok(user)
}

pub async fn find_user(db: &SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn find_credentials(db: &SqlitePool, email: &str) -> Result<Option<Credentials>, sqlx::Error> {
    sqlx::query_as::<_, Credentials>(
        "SELECT id, password_hash FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn update_user(
    db: &SqlitePool,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<Option<User>, AppError> {
    let Some(mut user) = find_user(db, user_id).await? else {
        return Ok(None);
    };

    if let Some(name) = name {
        user.name = name.to_string();
    }
    if let Some(email) = email {
        user.email = email.to_string();
    }

    sqlx::query("UPDATE users SET name = ?1, email = ?2 WHERE id = ?3")
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.id)
        .execute(db)
        .await
        .map_err(email_conflict)?;

    Ok(Some(user))
}

pub async fn insert_session(
    db: &SqlitePool,
    token: &str,
    user_id: &str,
    expires_at: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(token)
    .bind(user_id)
    .bind(super::now())
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

/// The owner of a live session token.
pub async fn find_session_user(
    db: &SqlitePool,
    token: &str,
    now: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > ?2")
        .bind(token)
        .bind(now)
        .fetch_optional(db)
        .await
}

pub async fn purge_expired_sessions(db: &SqlitePool, now: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
        .bind(now)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

fn email_conflict(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Email is already registered".to_string())
        }
        _ => AppError::Database(err),
    }
}
