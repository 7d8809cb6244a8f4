#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use taskboard::api;
use taskboard::config::AppConfig;
use taskboard::db;
use taskboard::draft::{GenerationError, TextGenerator};
use taskboard::state::AppState;

pub const CANNED_DRAFT: &str = r#"{"title":"Plan launch","description":"Get the launch ready","subtasks":["Write copy","Book venue"],"due_in_days":3}"#;

/// Returns the same text for every prompt, or fails when built with `None`.
pub struct CannedGenerator(pub Option<&'static str>);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        match self.0 {
            Some(text) => Ok(text.to_string()),
            None => Err(GenerationError::Status {
                status: 503,
                body: "model is loading".to_string(),
            }),
        }
    }
}

pub async fn test_state(generator: CannedGenerator) -> AppState {
    let db = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    db::migrate(&db).await.expect("Failed to run migrations");

    AppState {
        db,
        generator: Arc::new(generator),
        config: Arc::new(AppConfig::default()),
    }
}

pub async fn test_app() -> Router {
    api::router(test_state(CannedGenerator(Some(CANNED_DRAFT))).await)
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Registers a user and returns their bearer token.
pub async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Test User", "email": email, "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().expect("token missing").to_string()
}

pub async fn create_board(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = call(app, Method::POST, "/api/boards", Some(token), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "create board failed: {body}");
    body["id"].as_str().expect("board id missing").to_string()
}

pub async fn create_task(app: &Router, token: &str, board: &str, title: &str, status: &str) -> Value {
    let (code, body) = call(
        app,
        Method::POST,
        "/api/tasks",
        Some(token),
        Some(json!({ "title": title, "status": status, "board": board })),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "create task failed: {body}");
    body
}

pub fn titles(tasks: &Value) -> Vec<String> {
    tasks
        .as_array()
        .expect("expected an array")
        .iter()
        .map(|t| t["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Serves the router on an ephemeral port and returns the API base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}/api")
}
