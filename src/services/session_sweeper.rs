use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::{self, accounts};

/// Periodically drops expired session tokens.
pub struct SessionSweeper {
    db: SqlitePool,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(db: SqlitePool, interval: Duration) -> Self {
        Self { db, interval }
    }

    pub async fn start(self) {
        info!("Starting session sweeper (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.sweep_once().await {
                Ok(0) => debug!("no expired sessions"),
                Ok(purged) => info!("purged {} expired sessions", purged),
                // keep looping, the next tick retries
                Err(e) => warn!("session sweep failed: {:?}", e),
            }
        }
    }

    pub async fn sweep_once(&self) -> Result<u64, sqlx::Error> {
        accounts::purge_expired_sessions(&self.db, &db::now()).await
    }
}
