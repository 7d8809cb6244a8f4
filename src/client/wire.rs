//! Accepts the field spellings different backend versions have used and hands
//! the rest of the client canonical [`Task`] values.

use serde::Deserialize;

use crate::models::{DEFAULT_STATUS, StatusChange, Subtask, Task};

#[derive(Debug, Clone, Deserialize)]
pub struct WireTask {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
    #[serde(default, alias = "board_id", alias = "boardId")]
    pub board: String,
    #[serde(default, alias = "user_id", alias = "userId")]
    pub user: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, alias = "due_at", alias = "dueDate")]
    pub date: Option<String>,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub subtasks: Vec<WireSubtask>,
    #[serde(default)]
    pub history: Vec<WireHistoryEntry>,
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSubtask {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "done")]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<WireSubtask>,
}

/// Older backends stored plain strings in the history.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireHistoryEntry {
    Change {
        from: String,
        to: String,
        #[serde(alias = "time")]
        timestamp: String,
        #[serde(default, alias = "tz")]
        timezone: Option<String>,
    },
    Note(String),
}

/// A task, bare or wrapped as `{"success": true, "task": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskEnvelope {
    Wrapped { task: WireTask },
    Bare(WireTask),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskListEnvelope {
    Wrapped { tasks: Vec<WireTask> },
    Bare(Vec<WireTask>),
}

impl From<WireSubtask> for Subtask {
    fn from(wire: WireSubtask) -> Self {
        Subtask {
            id: wire.id,
            title: wire.title,
            completed: wire.completed,
            subtasks: wire.subtasks.into_iter().map(Subtask::from).collect(),
        }
    }
}

impl From<WireTask> for Task {
    fn from(wire: WireTask) -> Self {
        Task {
            id: wire.id,
            title: wire.title,
            description: wire.description.unwrap_or_default(),
            board_id: wire.board,
            user_id: wire.user,
            status: wire
                .status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            pinned: wire.pinned,
            completed: wire.completed,
            due_at: wire.date.filter(|d| !d.is_empty()),
            position: wire.position,
            subtasks: wire.subtasks.into_iter().map(Subtask::from).collect(),
            history: wire
                .history
                .into_iter()
                .filter_map(|entry| match entry {
                    WireHistoryEntry::Change {
                        from,
                        to,
                        timestamp,
                        timezone,
                    } => Some(StatusChange {
                        from,
                        to,
                        timestamp,
                        timezone: timezone.unwrap_or_default(),
                    }),
                    WireHistoryEntry::Note(_) => None,
                })
                .collect(),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

impl From<TaskEnvelope> for Task {
    fn from(envelope: TaskEnvelope) -> Self {
        match envelope {
            TaskEnvelope::Wrapped { task } | TaskEnvelope::Bare(task) => task.into(),
        }
    }
}

impl From<TaskListEnvelope> for Vec<Task> {
    fn from(envelope: TaskListEnvelope) -> Self {
        let tasks = match envelope {
            TaskListEnvelope::Wrapped { tasks } | TaskListEnvelope::Bare(tasks) => tasks,
        };
        tasks.into_iter().map(Task::from).collect()
    }
}
