use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    NotConfigured,

    #[error("text generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("text generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text generation service returned no text")]
    Empty,
}

/// Anything that turns a prompt into free text. Failure is routine here.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone, Debug)]
pub struct ChatModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// OpenAI-compatible chat completions (the Hugging Face router speaks this).
pub struct ChatCompletionGenerator {
    client: Client,
    config: ChatModelConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

const SYSTEM_INSTRUCTION: &str = "You are an experienced project manager who writes actionable task plans. \
Reply with a single JSON object and nothing else.";

fn planning_instruction(prompt: &str) -> String {
    format!(
        r#"Write a task plan for: "{prompt}"

Respond with JSON shaped like:
{{
  "title": "short title, at most eight words",
  "description": "three or four sentences covering goal, requirements and outcome",
  "subtasks": ["first concrete step", "second concrete step", "third concrete step", "fourth concrete step"],
  "due_in_days": 7,
  "priority": "low | medium | high",
  "category": "a fitting category"
}}

Keep subtasks sequential and achievable and pick due_in_days between 3 and 14."#
    )
}

impl ChatCompletionGenerator {
    pub fn new(config: ChatModelConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: planning_instruction(prompt),
                },
            ],
            max_tokens: 500,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::Empty)
    }
}

#[derive(Clone, Debug)]
pub struct TextModelConfig {
    pub api_key: String,
    pub url: String,
    pub timeout: Duration,
}

/// Plain text-generation inference endpoint (`{"inputs": ...}` in, `generated_text` out).
pub struct TextInferenceGenerator {
    client: Client,
    config: TextModelConfig,
}

impl TextInferenceGenerator {
    pub fn new(config: TextModelConfig) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for TextInferenceGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": { "max_new_tokens": 256, "temperature": 0.6 }
        });

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let value: Value = response.json().await?;
        let text = generated_text(value);
        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

/// Inference endpoints answer with a list, a single object, or a bare string.
fn generated_text(value: Value) -> String {
    let found = match &value {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(_) => value.get("generated_text"),
        _ => None,
    }
    .and_then(Value::as_str)
    .map(str::to_string);

    match (found, value) {
        (Some(text), _) => text,
        (None, Value::String(text)) => text,
        (None, other) => other.to_string(),
    }
}

/// Stands in when no API key is configured.
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_text_accepts_all_response_shapes() {
        assert_eq!(generated_text(json!([{"generated_text": "a"}])), "a");
        assert_eq!(generated_text(json!({"generated_text": "b"})), "b");
        assert_eq!(generated_text(json!("c")), "c");
        assert_eq!(generated_text(json!({"other": 1})), r#"{"other":1}"#);
    }

    #[test]
    fn planning_instruction_mentions_prompt() {
        assert!(planning_instruction("Plan a trip").contains("\"Plan a trip\""));
    }
}
