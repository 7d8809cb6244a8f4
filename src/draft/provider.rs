use async_trait::async_trait;
use tracing::{info, warn};

use super::{TaskDraft, TextGenerator, fallback_draft, normalize_text};

/// Why a provider produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoResult {
    Unavailable(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftOutcome {
    Drafted(TaskDraft),
    NoResult(NoResult),
}

#[async_trait]
pub trait DraftProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn provide(&self, prompt: &str) -> DraftOutcome;
}

/// Wraps a [`TextGenerator`] and normalizes whatever it returns.
pub struct ModelDraftProvider<G> {
    name: String,
    generator: G,
}

impl<G: TextGenerator> ModelDraftProvider<G> {
    pub fn new(name: impl Into<String>, generator: G) -> Self {
        Self {
            name: name.into(),
            generator,
        }
    }
}

#[async_trait]
impl<G: TextGenerator> DraftProvider for ModelDraftProvider<G> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, prompt: &str) -> DraftOutcome {
        match self.generator.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => DraftOutcome::NoResult(NoResult::Empty),
            Ok(text) => DraftOutcome::Drafted(normalize_text(&text, prompt)),
            Err(e) => DraftOutcome::NoResult(NoResult::Unavailable(e.to_string())),
        }
    }
}

/// Always succeeds. The pipeline runs it last.
pub struct StaticFallback;

#[async_trait]
impl DraftProvider for StaticFallback {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn provide(&self, prompt: &str) -> DraftOutcome {
        DraftOutcome::Drafted(fallback_draft(prompt))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftReport {
    pub draft: TaskDraft,
    /// Name of the provider that produced the draft.
    pub source: String,
    /// Providers that came back empty, in the order they were tried.
    pub skipped: Vec<(String, NoResult)>,
    pub primary_failed: bool,
}

/// Providers tried in order; the static fallback closes the list.
#[derive(Default)]
pub struct DraftPipeline {
    providers: Vec<Box<dyn DraftProvider>>,
}

impl DraftPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl DraftProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn draft(&self, prompt: &str) -> DraftReport {
        let mut skipped = Vec::new();

        for provider in &self.providers {
            match provider.provide(prompt).await {
                DraftOutcome::Drafted(draft) => {
                    info!(provider = provider.name(), "draft produced");
                    return DraftReport {
                        draft,
                        source: provider.name().to_string(),
                        primary_failed: !skipped.is_empty(),
                        skipped,
                    };
                }
                DraftOutcome::NoResult(reason) => {
                    warn!(provider = provider.name(), ?reason, "draft provider gave no result");
                    skipped.push((provider.name().to_string(), reason));
                }
            }
        }

        DraftReport {
            draft: fallback_draft(prompt),
            source: StaticFallback.name().to_string(),
            primary_failed: !skipped.is_empty(),
            skipped,
        }
    }
}
