use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub const DEFAULT_STATUS: &str = "todo";

/// Columns every board has. They can never be deleted.
pub const BUILTIN_STATUSES: [&str; 3] = ["todo", "inprogress", "done"];

pub fn is_builtin_status(name: &str) -> bool {
    BUILTIN_STATUSES.contains(&name)
}

pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "board")]
    pub board_id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub status: String,
    pub pinned: bool,
    pub completed: bool,
    #[serde(rename = "date")]
    pub due_at: Option<String>,
    pub position: f64,
    pub subtasks: Vec<Subtask>,
    pub history: Vec<StatusChange>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Applies a partial update, recording a history entry when the status moves.
    pub fn apply_patch(&mut self, patch: TaskPatch, at: &str) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(due_at) = patch.date {
            self.due_at = due_at;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(mut subtasks) = patch.subtasks {
            Subtask::assign_ids(&mut subtasks);
            self.subtasks = subtasks;
        }
        if let Some(status) = patch.status {
            if status != self.status {
                let from = std::mem::replace(&mut self.status, status.clone());
                self.history.push(StatusChange {
                    from,
                    to: status,
                    timestamp: at.to_string(),
                    timezone: patch
                        .timezone
                        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
                });
            }
        }
        self.updated_at = at.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Empty until the gateway (or the client, for unsaved drafts) assigns one.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            completed: false,
            subtasks: Vec::new(),
        }
    }

    /// Fills in missing ids, depth first.
    pub fn assign_ids(subtasks: &mut [Subtask]) {
        for subtask in subtasks {
            if subtask.id.is_empty() {
                subtask.id = uuid::Uuid::new_v4().to_string();
            }
            Self::assign_ids(&mut subtask.subtasks);
        }
    }
}

/// Append-only record of a status transition. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: String,
    pub to: String,
    pub timestamp: String,
    pub timezone: String,
}

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub board_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub pinned: bool,
    pub completed: bool,
    pub due_at: Option<String>,
    pub position: f64,
    pub subtasks: String,
    pub history: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = serde_json::Error;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            subtasks: serde_json::from_str(&row.subtasks)?,
            history: serde_json::from_str(&row.history)?,
            id: row.id,
            title: row.title,
            description: row.description,
            board_id: row.board_id,
            user_id: row.user_id,
            status: row.status,
            pinned: row.pinned,
            completed: row.completed,
            due_at: row.due_at,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// IANA zone recorded in the initial history entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Partial update. Absent fields are left untouched; `date: null` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl TaskPatch {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    pub pinned: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_missing_and_null_date() {
        let missing: TaskPatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(missing.date, None);

        let cleared: TaskPatch = serde_json::from_str(r#"{"date":null}"#).unwrap();
        assert_eq!(cleared.date, Some(None));

        let set: TaskPatch = serde_json::from_str(r#"{"date":"2026-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(set.date, Some(Some("2026-01-01T00:00:00Z".to_string())));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_value(TaskPatch::status("done").position(2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "done", "position": 2.5}));
    }

    fn sample_task() -> Task {
        Task {
            id: "t1".into(),
            title: "Write report".into(),
            description: String::new(),
            board_id: "b1".into(),
            user_id: "u1".into(),
            status: "todo".into(),
            pinned: false,
            completed: false,
            due_at: Some("2026-01-01T00:00:00Z".into()),
            position: 0.0,
            subtasks: Vec::new(),
            history: Vec::new(),
            created_at: "2026-01-01T00:00:00.000000Z".into(),
            updated_at: "2026-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn status_change_appends_history() {
        let mut task = sample_task();
        let patch = TaskPatch {
            timezone: Some("Europe/Berlin".into()),
            ..TaskPatch::status("inprogress")
        };
        task.apply_patch(patch, "2026-02-01T10:00:00.000000Z");

        assert_eq!(task.status, "inprogress");
        assert_eq!(
            task.history,
            vec![StatusChange {
                from: "todo".into(),
                to: "inprogress".into(),
                timestamp: "2026-02-01T10:00:00.000000Z".into(),
                timezone: "Europe/Berlin".into(),
            }]
        );
        assert_eq!(task.updated_at, "2026-02-01T10:00:00.000000Z");
    }

    #[test]
    fn same_status_and_null_date() {
        let mut task = sample_task();
        let patch = TaskPatch {
            date: Some(None),
            ..TaskPatch::status("todo")
        };
        task.apply_patch(patch, "2026-02-01T10:00:00.000000Z");

        assert!(task.history.is_empty());
        assert_eq!(task.due_at, None);
    }

    #[test]
    fn assign_ids_fills_nested_subtasks() {
        let mut subtasks = vec![Subtask {
            subtasks: vec![Subtask::new("child")],
            ..Subtask::new("parent")
        }];
        Subtask::assign_ids(&mut subtasks);
        assert!(!subtasks[0].id.is_empty());
        assert!(!subtasks[0].subtasks[0].id.is_empty());
    }
}
