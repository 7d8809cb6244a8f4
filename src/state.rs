use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::draft::TextGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub generator: Arc<dyn TextGenerator>,
    pub config: Arc<AppConfig>,
}
