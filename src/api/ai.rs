use axum::Json;
use axum::extract::State;

use crate::error::AppError;
use crate::models::{GenerateRequest, GenerateResponse};
use crate::services::DraftService;
use crate::state::AppState;

pub(super) async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let prompt = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Prompt is required".to_string()))?;

    let service = DraftService::new(state.generator.clone());
    let response = service.generate(prompt).await?;
    Ok(Json(response))
}
