//! AI-assisted task drafting.
//!
//! Model output (JSON or free text) is turned into a [`TaskDraft`] in two steps:
//! [`extract`] pulls whatever fields it can find into a [`RawDraft`], then
//! [`normalize`] applies the length caps and fallbacks. Generation itself sits
//! behind [`TextGenerator`], and [`DraftPipeline`] chains providers so a draft is
//! always produced even when every remote service is down.

pub mod extract;
pub mod generator;
pub mod normalize;
pub mod provider;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{NewTaskRequest, Subtask};

pub use extract::extract;
pub use generator::{
    ChatCompletionGenerator, GenerationError, TextGenerator, TextInferenceGenerator,
    UnconfiguredGenerator,
};
pub use normalize::{GENERIC_CHECKLIST, fallback_draft, normalize, normalize_text};
pub use provider::{
    DraftOutcome, DraftPipeline, DraftProvider, DraftReport, ModelDraftProvider, NoResult,
    StaticFallback,
};

/// Fields pulled out of model output before any cleanup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subtasks: Vec<String>,
    pub due_in_days: Option<f64>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl RawDraft {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.subtasks.is_empty()
            && self.due_in_days.is_none()
    }
}

/// A proposed task, shown in the edit form for confirmation before anything is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub subtasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_in_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskDraft {
    /// Absolute due time, counted from the moment the user accepts the draft.
    pub fn due_at(&self, accepted_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = self.due_in_days.filter(|days| days.is_finite())?;
        let offset = TimeDelta::try_seconds((days * 86_400.0).round() as i64)?;
        accepted_at.checked_add_signed(offset)
    }

    /// Create-task fields for the accepted draft. Subtasks get client-side ids.
    pub fn into_form(self, status: &str, accepted_at: DateTime<Utc>) -> NewTaskRequest {
        let date = self.due_at(accepted_at).map(|due| due.to_rfc3339());
        let mut subtasks: Vec<Subtask> = self.subtasks.into_iter().map(Subtask::new).collect();
        Subtask::assign_ids(&mut subtasks);

        NewTaskRequest {
            title: Some(self.title),
            description: Some(self.description),
            status: Some(status.to_string()),
            board: None,
            date,
            subtasks,
            timezone: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(due_in_days: Option<f64>) -> TaskDraft {
        TaskDraft {
            title: "Ship".to_string(),
            description: "Ship it".to_string(),
            subtasks: vec!["Build".to_string(), "Test".to_string()],
            due_in_days,
            priority: None,
            category: None,
        }
    }

    #[test]
    fn due_offset_counts_from_acceptance() {
        let accepted = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let due = draft(Some(7.0)).due_at(accepted).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 8, 9, 30, 0).unwrap());
    }

    #[test]
    fn fractional_days_are_honoured() {
        let accepted = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let due = draft(Some(0.5)).due_at(accepted).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn missing_or_non_finite_offset_has_no_due_date() {
        let accepted = Utc::now();
        assert!(draft(None).due_at(accepted).is_none());
        assert!(draft(Some(f64::NAN)).due_at(accepted).is_none());
    }

    #[test]
    fn form_carries_status_and_fresh_subtask_ids() {
        let accepted = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let form = draft(Some(1.0)).into_form("inprogress", accepted);
        assert_eq!(form.status.as_deref(), Some("inprogress"));
        assert_eq!(form.date.as_deref(), Some("2026-03-02T00:00:00+00:00"));
        assert_eq!(form.subtasks.len(), 2);
        assert!(form.subtasks.iter().all(|s| !s.id.is_empty() && !s.completed));
    }
}
