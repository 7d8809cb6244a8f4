use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::config::AppConfig;
use taskboard::services::SessionSweeper;
use taskboard::{api, build_state, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "taskboard=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    if config.chat_model.is_none() {
        warn!("HF_API_KEY not set, task generation will answer with errors");
    }

    let sweeper = SessionSweeper::new(pool.clone(), config.sweep_interval);
    tokio::spawn(async move {
        sweeper.start().await;
    });

    let addr = config.bind_addr;
    let state = build_state(pool, config)?;
    let app = api::router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
