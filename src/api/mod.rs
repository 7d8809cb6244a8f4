mod ai;
mod auth;
mod boards;
mod tasks;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, request};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

/// Accepts payloads with embedded images and long descriptions.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile).put(auth::update_profile))
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route("/boards/{id}", delete(boards::delete_board))
        .route("/boards/{id}/archive", patch(boards::archive_board))
        .route("/boards/{id}/restore", patch(boards::restore_board))
        .route(
            "/boards/{id}/custom-column/{column}",
            delete(boards::delete_custom_column),
        )
        .route("/tasks", post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::list_tasks)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/pin", patch(tasks::toggle_pin))
        .route("/ai/generate", post(ai::generate));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn route_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: StatusCode::NOT_FOUND.to_string(),
            message: "Route not found".to_string(),
        }),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = AllowedOrigins::new(origins);

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| allowed.matches(origin),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}

/// Exact origins plus `*.example.com` style suffix entries.
#[derive(Debug, Clone, Default)]
struct AllowedOrigins {
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl AllowedOrigins {
    fn new(origins: &[String]) -> Self {
        let mut allowed = Self::default();
        for origin in origins {
            let origin = origin.trim().trim_end_matches('/');
            if let Some(suffix) = origin.strip_prefix("*.") {
                allowed.suffixes.push(format!(".{suffix}"));
            } else if !origin.is_empty() {
                allowed.exact.push(origin.to_string());
            }
        }
        allowed
    }

    fn matches(&self, origin: &HeaderValue) -> bool {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        if self.exact.iter().any(|allowed| allowed == origin) {
            return true;
        }

        let host = origin
            .split_once("://")
            .map_or(origin, |(_, rest)| rest);
        let host = host.split(':').next().unwrap_or(host);
        self.suffixes.iter().any(|suffix| host.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins(list: &[&str]) -> AllowedOrigins {
        AllowedOrigins::new(&list.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn exact_and_suffix_origins() {
        let allowed = origins(&["http://localhost:5173", "*.vercel.app"]);

        assert!(allowed.matches(&HeaderValue::from_static("http://localhost:5173")));
        assert!(allowed.matches(&HeaderValue::from_static("https://board-preview.vercel.app")));
        assert!(!allowed.matches(&HeaderValue::from_static("http://localhost:3000")));
        assert!(!allowed.matches(&HeaderValue::from_static("https://vercel.app.evil.com")));
    }
}
