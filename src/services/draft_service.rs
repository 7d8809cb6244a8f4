use std::sync::Arc;

use tracing::{info, warn};

use crate::draft::{TextGenerator, normalize_text};
use crate::error::AppError;
use crate::models::GenerateResponse;

/// Turns a prompt into a normalized task suggestion via the configured model.
pub struct DraftService {
    generator: Arc<dyn TextGenerator>,
}

impl DraftService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, AppError> {
        info!(prompt_chars = prompt.chars().count(), "generating task draft");

        let raw = self.generator.generate(prompt).await.map_err(|e| {
            warn!("task generation failed: {}", e);
            AppError::Upstream(format!("AI generation failed: {e}"))
        })?;

        let draft = normalize_text(&raw, prompt);
        Ok(GenerateResponse::new(raw, draft))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::draft::GenerationError;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn wraps_normalized_draft() {
        let service = DraftService::new(Arc::new(Canned(
            r#"{"title":"Plan trip","description":"Book it","subtasks":["Flights","Hotel"]}"#,
        )));
        let response = service.generate("plan a trip").await.unwrap();

        assert!(response.success);
        assert_eq!(response.task.title, "Plan trip");
        assert_eq!(response.task.subtasks.len(), 2);
        assert_eq!(response.task.priority, "medium");
    }

    #[tokio::test]
    async fn unconfigured_model_is_upstream_error() {
        let service = DraftService::new(Arc::new(crate::draft::UnconfiguredGenerator));
        let err = service.generate("anything").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
