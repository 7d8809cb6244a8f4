use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Board, GenerateResponse, NewTaskRequest, Task, TaskPatch};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("session expired")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request timed out")]
    Timeout,

    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("gateway returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => GatewayError::Validation(message),
            401 => GatewayError::Unauthorized,
            404 => GatewayError::NotFound(message),
            409 => GatewayError::Conflict(message),
            408 | 504 => GatewayError::Timeout,
            _ => GatewayError::Server { status, message },
        }
    }
}

/// Everything the board session needs from the backend.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, GatewayError>;
    async fn create_board(&self, name: &str) -> Result<Board, GatewayError>;
    async fn archive_board(&self, board_id: &str) -> Result<Board, GatewayError>;
    async fn restore_board(&self, board_id: &str) -> Result<Board, GatewayError>;
    async fn delete_board(&self, board_id: &str) -> Result<(), GatewayError>;
    /// Returns how many tasks went with the column.
    async fn delete_custom_column(&self, board_id: &str, column: &str) -> Result<u64, GatewayError>;

    async fn list_tasks(&self, board_id: &str) -> Result<Vec<Task>, GatewayError>;
    async fn create_task(&self, task: &NewTaskRequest) -> Result<Task, GatewayError>;
    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<Task, GatewayError>;
    async fn delete_task(&self, task_id: &str) -> Result<(), GatewayError>;
    /// Returns the new pinned state.
    async fn toggle_pin(&self, task_id: &str) -> Result<bool, GatewayError>;

    async fn generate_draft(&self, prompt: &str) -> Result<GenerateResponse, GatewayError>;
}
