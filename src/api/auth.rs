use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::info;

use crate::auth::{self, AuthUser};
use crate::db::accounts;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, User};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;

pub(super) async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(req.name),
        non_blank(req.email).map(|e| normalize_email(&e)),
        req.password,
    ) else {
        return Err(AppError::BadRequest(
            "Name, email and password are required".to_string(),
        ));
    };
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let hash = auth::hash_password(&password)?;
    let user = accounts::insert_user(&state.db, &name, &email, &hash).await?;
    let token = auth::issue_session(&state.db, &user.id, state.config.session_ttl_hours).await?;

    info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (Some(email), Some(password)) = (non_blank(req.email), req.password) else {
        return Err(AppError::BadRequest("Email and password are required".to_string()));
    };

    let credentials = accounts::find_credentials(&state.db, &normalize_email(&email))
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&password, &credentials.password_hash) {
        return Err(invalid());
    }

    let user = accounts::find_user(&state.db, &credentials.id)
        .await?
        .ok_or_else(invalid)?;
    let token = auth::issue_session(&state.db, &user.id, state.config.session_ttl_hours).await?;

    Ok(Json(AuthResponse { token, user }))
}

pub(super) async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = accounts::find_user(&state.db, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}

pub(super) async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let name = non_blank(req.name);
    let email = non_blank(req.email).map(|e| normalize_email(&e));

    let user = accounts::update_user(&state.db, &user.user_id, name.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
