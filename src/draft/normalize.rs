use tracing::warn;

use super::{RawDraft, TaskDraft, extract};

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_SUBTASKS: usize = 6;
pub const MAX_SUBTASK_CHARS: usize = 100;
const PROMPT_TITLE_CHARS: usize = 40;

/// Used whenever no subtasks could be recovered, including the unconditional fallback.
pub const GENERIC_CHECKLIST: [&str; 5] = [
    "Research and gather all necessary information",
    "Create a detailed implementation plan",
    "Execute the main task components",
    "Review work and make improvements",
    "Finalize and complete the task",
];

/// Extracts and normalizes in one go. Falls back to [`fallback_draft`] when the
/// text contains nothing recognisable.
pub fn normalize_text(text: &str, prompt: &str) -> TaskDraft {
    let raw = extract(text);
    if raw.is_empty() {
        warn!("no draft fields found in generated text, using fallback draft");
        return fallback_draft(prompt);
    }
    normalize(raw, prompt)
}

pub fn normalize(raw: RawDraft, prompt: &str) -> TaskDraft {
    let prompt = prompt.trim();

    let title = raw
        .title
        .as_deref()
        .map(clean_title)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| title_from_prompt(prompt));

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| generic_description(prompt));

    let mut subtasks: Vec<String> = raw
        .subtasks
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_SUBTASKS)
        .map(clip_subtask)
        .collect();
    if subtasks.is_empty() {
        subtasks = GENERIC_CHECKLIST.iter().map(|s| s.to_string()).collect();
    }

    TaskDraft {
        title,
        description,
        subtasks,
        due_in_days: raw.due_in_days.filter(|days| days.is_finite()),
        priority: raw.priority,
        category: raw.category,
    }
}

/// The draft used when every provider came back empty-handed.
pub fn fallback_draft(prompt: &str) -> TaskDraft {
    let prompt = prompt.trim();
    let title = (!prompt.is_empty())
        .then(|| format!("Task: {}", take_chars(prompt, PROMPT_TITLE_CHARS).trim_end()));

    normalize(
        RawDraft {
            title,
            description: Some(generic_description(prompt)),
            subtasks: GENERIC_CHECKLIST.iter().map(|s| s.to_string()).collect(),
            ..RawDraft::default()
        },
        prompt,
    )
}

fn clean_title(title: &str) -> String {
    let first_sentence = title.split('.').next().unwrap_or_default();
    let unquoted: String = first_sentence
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}'))
        .collect();
    take_chars(&unquoted, MAX_TITLE_CHARS).trim().to_string()
}

fn title_from_prompt(prompt: &str) -> String {
    let title = take_chars(prompt, PROMPT_TITLE_CHARS).trim();
    if title.is_empty() {
        "Untitled task".to_string()
    } else {
        title.to_string()
    }
}

fn generic_description(prompt: &str) -> String {
    if prompt.is_empty() {
        "Comprehensive task plan. This includes detailed steps and requirements for successful completion.".to_string()
    } else {
        format!(
            "Comprehensive task plan for: {prompt}. This includes detailed steps and requirements for successful completion."
        )
    }
}

fn clip_subtask(subtask: &str) -> String {
    if subtask.chars().count() > MAX_SUBTASK_CHARS {
        format!("{}...", take_chars(subtask, MAX_SUBTASK_CHARS))
    } else {
        subtask.to_string()
    }
}

fn take_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
