use std::sync::Arc;

use async_trait::async_trait;

use super::gateway::TaskGateway;
use crate::draft::{DraftOutcome, DraftProvider, NoResult, RawDraft, normalize};

/// Asks the gateway's generate endpoint for a draft.
pub struct GatewayDraftProvider<G> {
    gateway: Arc<G>,
}

impl<G: TaskGateway> GatewayDraftProvider<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: TaskGateway> DraftProvider for GatewayDraftProvider<G> {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn provide(&self, prompt: &str) -> DraftOutcome {
        let response = match self.gateway.generate_draft(prompt).await {
            Ok(response) => response,
            Err(e) => return DraftOutcome::NoResult(NoResult::Unavailable(e.to_string())),
        };
        if !response.success {
            return DraftOutcome::NoResult(NoResult::Empty);
        }

        let task = response.task;
        let raw = RawDraft {
            title: Some(task.title),
            description: Some(task.description),
            subtasks: task.subtasks.into_iter().map(|s| s.title).collect(),
            due_in_days: Some(task.due_in_days),
            priority: Some(task.priority),
            category: Some(task.category),
        };
        // the gateway normalizes already; doing it again keeps older servers in bounds
        DraftOutcome::Drafted(normalize(raw, prompt))
    }
}
