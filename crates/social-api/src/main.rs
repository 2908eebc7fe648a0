//! socialdb REST API server.

use social_api::config::ApiConfig;
use social_api::server::{self, AppState};
use social_loader::BackgroundLoader;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;
    // Queries answer 503 until the snapshot is Ready.
    let loader = Arc::new(BackgroundLoader::spawn(config.loader.clone()));
    let state = Arc::new(AppState { loader });

    let app = server::router(state);
    tracing::info!("socialdb API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
