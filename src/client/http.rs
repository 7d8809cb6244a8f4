use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::gateway::{GatewayError, TaskGateway};
use super::wire::{TaskEnvelope, TaskListEnvelope};
use crate::config::ClientConfig;
use crate::models::{
    AuthResponse, Board, DeleteColumnResponse, GenerateResponse, NewTaskRequest, PinResponse, Task,
    TaskPatch, User,
};

/// [`TaskGateway`] over the REST API. Holds the bearer token for the session.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(config.token.clone()),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let auth: AuthResponse = self
            .send(self.client.post(self.url("/auth/register")).json(&body))
            .await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        let body = json!({ "email": email, "password": password });
        let auth: AuthResponse = self
            .send(self.client.post(self.url("/auth/login")).json(&body))
            .await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn profile(&self) -> Result<User, GatewayError> {
        self.send(self.client.get(self.url("/auth/profile"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base URL plus path segments, each percent-encoded on its own so
    /// user-chosen names cannot add segments, a query or a fragment.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Transport(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let request = match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        debug!(status = status.as_u16(), %message, "gateway request failed");

        let error = GatewayError::from_status(status.as_u16(), message);
        if error == GatewayError::Unauthorized {
            warn!("session rejected by gateway, dropping token");
            self.clear_token();
        }
        Err(error)
    }
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl TaskGateway for HttpGateway {
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError> {
        self.send(self.client.get(self.url("/boards"))).await
    }

    async fn create_board(&self, name: &str) -> Result<Board, GatewayError> {
        let body = json!({ "name": name });
        self.send(self.client.post(self.url("/boards")).json(&body)).await
    }

    async fn archive_board(&self, board_id: &str) -> Result<Board, GatewayError> {
        self.send(self.client.patch(self.url(&format!("/boards/{board_id}/archive"))))
            .await
    }

    async fn restore_board(&self, board_id: &str) -> Result<Board, GatewayError> {
        self.send(self.client.patch(self.url(&format!("/boards/{board_id}/restore"))))
            .await
    }

    async fn delete_board(&self, board_id: &str) -> Result<(), GatewayError> {
        self.dispatch(self.client.delete(self.url(&format!("/boards/{board_id}"))))
            .await?;
        Ok(())
    }

    async fn delete_custom_column(&self, board_id: &str, column: &str) -> Result<u64, GatewayError> {
        let url = self.segment_url(&["boards", board_id, "custom-column", column])?;
        let response: DeleteColumnResponse = self.send(self.client.delete(url)).await?;
        Ok(response.deleted_tasks)
    }

    async fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, GatewayError> {
        let tasks: TaskListEnvelope = self
            .send(self.client.get(self.url(&format!("/tasks/{board_id}"))))
            .await?;
        Ok(tasks.into())
    }

    async fn create_task(&self, task: &NewTaskRequest) -> Result<Task, GatewayError> {
        let created: TaskEnvelope = self
            .send(self.client.post(self.url("/tasks")).json(task))
            .await?;
        Ok(created.into())
    }

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, GatewayError> {
        let updated: TaskEnvelope = self
            .send(self.client.put(self.url(&format!("/tasks/{task_id}"))).json(patch))
            .await?;
        Ok(updated.into())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), GatewayError> {
        self.dispatch(self.client.delete(self.url(&format!("/tasks/{task_id}"))))
            .await?;
        Ok(())
    }

    async fn toggle_pin(&self, task_id: &str) -> Result<bool, GatewayError> {
        let response: PinResponse = self
            .send(self.client.patch(self.url(&format!("/tasks/{task_id}/pin"))))
            .await?;
        Ok(response.pinned)
    }

    async fn generate_draft(&self, prompt: &str) -> Result<GenerateResponse, GatewayError> {
        let body = json!({ "prompt": prompt });
        self.send(self.client.post(self.url("/ai/generate")).json(&body))
            .await
    }
}
