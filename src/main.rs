use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kopi_api::config::AppConfig;
use kopi_api::{db, events, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let db = Arc::new(
        db::establish_connection(&config.database_url)
            .await
            .context("failed to connect to database")?,
    );

    let (event_sender, mut event_rx) = events::channel(256);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            info!(?event, "event dispatched");
        }
    });

    let state = AppState::new(db, config.clone(), event_sender);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .context("failed to bind listener")?;
    info!(host = %config.host, port = config.port, "kopi-api listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
