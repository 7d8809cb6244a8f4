use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub archived: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBoardRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// A user-defined column. Lives in client-local settings, never in the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStatus {
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl CustomStatus {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }
}

pub fn default_icon() -> String {
    "FiCheckCircle".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteColumnResponse {
    pub message: String,
    #[serde(rename = "deletedTasks")]
    pub deleted_tasks: u64,
}
