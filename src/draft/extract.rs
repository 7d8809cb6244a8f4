use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::RawDraft;

static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^title\s*[:\-]\s*(.*)$").unwrap());
static DESCRIPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^desc(?:ription)?\s*[:\-]\s*(.*)$").unwrap());
static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+(.+)$").unwrap());
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```$").unwrap());

/// Best-effort field extraction. Tries strict JSON first (optionally inside a
/// single code fence), then line heuristics. Never fails; an empty [`RawDraft`]
/// means nothing usable was found.
pub fn extract(text: &str) -> RawDraft {
    let trimmed = text.trim();

    if let Some(raw) = parse_structured(trimmed) {
        return raw;
    }

    if let Some(body) = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    {
        if let Some(raw) = parse_structured(body) {
            return raw;
        }
        return parse_lines(body);
    }

    parse_lines(trimmed)
}

fn parse_structured(text: &str) -> Option<RawDraft> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    Some(RawDraft {
        title: string_field(object, "title"),
        description: string_field(object, "description").or_else(|| string_field(object, "desc")),
        subtasks: object
            .get("subtasks")
            .and_then(Value::as_array)
            .map(|items| subtask_titles(items))
            .unwrap_or_default(),
        due_in_days: object.get("due_in_days").and_then(number_like),
        priority: string_field(object, "priority"),
        category: string_field(object, "category"),
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn subtask_titles(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::String(title) => Some(title.clone()),
            Value::Object(fields) => Some(
                string_field(fields, "title").unwrap_or_else(|| format!("Step {}", index + 1)),
            ),
            _ => None,
        })
        .collect()
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn parse_lines(text: &str) -> RawDraft {
    let mut raw = RawDraft::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = TITLE_LINE.captures(line) {
            if raw.title.is_none() {
                raw.title = non_empty(&caps[1]);
            }
        } else if let Some(caps) = DESCRIPTION_LINE.captures(line) {
            if raw.description.is_none() {
                raw.description = non_empty(&caps[1]);
            }
        } else if let Some(caps) = BULLET_LINE.captures(line) {
            raw.subtasks.push(caps[1].trim().to_string());
        }
    }

    raw
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_object_fields() {
        let raw = extract(
            r#"{"title":"Plan party","desc":"Invite people","subtasks":["Guests",{"title":"Cake"},{}],"due_in_days":"5"}"#,
        );
        assert_eq!(raw.title.as_deref(), Some("Plan party"));
        assert_eq!(raw.description.as_deref(), Some("Invite people"));
        assert_eq!(raw.subtasks, vec!["Guests", "Cake", "Step 3"]);
        assert_eq!(raw.due_in_days, Some(5.0));
    }

    #[test]
    fn description_key_wins_over_desc() {
        let raw = extract(r#"{"description":"long","desc":"short"}"#);
        assert_eq!(raw.description.as_deref(), Some("long"));
    }

    #[test]
    fn reads_json_inside_code_fence() {
        let raw = extract("```json\n{\"title\":\"Fenced\",\"due_in_days\":3}\n```");
        assert_eq!(raw.title.as_deref(), Some("Fenced"));
        assert_eq!(raw.due_in_days, Some(3.0));
    }

    #[test]
    fn falls_back_to_line_heuristics() {
        let raw = extract("Title: Ship v2\n- Design\n- Build\n- Test");
        assert_eq!(raw.title.as_deref(), Some("Ship v2"));
        assert_eq!(raw.subtasks, vec!["Design", "Build", "Test"]);
        assert!(raw.description.is_none());
    }

    #[test]
    fn line_prefixes_are_case_insensitive_and_first_match_wins() {
        let raw = extract("TITLE- First\ntitle: Second\nDescription: Details here\n* star bullet");
        assert_eq!(raw.title.as_deref(), Some("First"));
        assert_eq!(raw.description.as_deref(), Some("Details here"));
        assert_eq!(raw.subtasks, vec!["star bullet"]);
    }

    #[test]
    fn non_object_json_uses_line_heuristics() {
        let raw = extract("[\"a\", \"b\"]");
        assert!(raw.is_empty());
    }

    #[test]
    fn unstructured_blob_yields_nothing() {
        assert!(extract("Sure! Here is a lovely plan for you.").is_empty());
        assert!(extract("").is_empty());
        assert!(extract("   \n\t ").is_empty());
        assert!(extract("{\"title\": ").is_empty());
    }
}
