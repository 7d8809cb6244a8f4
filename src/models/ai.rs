use serde::{Deserialize, Serialize};

use crate::draft::TaskDraft;

pub const DEFAULT_DUE_IN_DAYS: f64 = 7.0;
pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_CATEGORY: &str = "Planning";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub result: String,
    pub task: GeneratedTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTask {
    pub title: String,
    pub description: String,
    pub subtasks: Vec<GeneratedSubtask>,
    pub due_in_days: f64,
    pub priority: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSubtask {
    pub title: String,
}

impl GenerateResponse {
    pub fn new(result: String, draft: TaskDraft) -> Self {
        Self {
            success: true,
            result,
            task: GeneratedTask {
                subtasks: draft
                    .subtasks
                    .into_iter()
                    .map(|title| GeneratedSubtask { title })
                    .collect(),
                title: draft.title,
                description: draft.description,
                due_in_days: draft.due_in_days.unwrap_or(DEFAULT_DUE_IN_DAYS),
                priority: draft.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
                category: draft.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            },
        }
    }
}
