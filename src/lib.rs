pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::draft::{ChatCompletionGenerator, GenerationError, TextGenerator, UnconfiguredGenerator};
use crate::state::AppState;

/// Wires the pool and the configured model into shared handler state.
pub fn build_state(db: SqlitePool, config: AppConfig) -> Result<AppState, GenerationError> {
    let generator: Arc<dyn TextGenerator> = match config.chat_model.clone() {
        Some(model) => Arc::new(ChatCompletionGenerator::new(model)?),
        None => Arc::new(UnconfiguredGenerator),
    };

    Ok(AppState {
        db,
        generator,
        config: Arc::new(config),
    })
}
