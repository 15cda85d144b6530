mod artifacts;
mod classifier;
mod config;
mod engine;
mod error;
mod page;
mod server;
mod types;
mod vectorizer;

use anyhow::Context;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use artifacts::{ArtifactConfig, ModelArtifacts};
use config::Config;
use engine::TfidfEngine;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fake_news_detector=debug".into()),
        )
        .init();

    let config = Config::parse();
    tracing::info!("Starting fake news detector with config: {:?}", config);

    if config.model_id.is_none() && config.model_path.is_none() {
        anyhow::bail!("Either --model-id or --model-path must be provided");
    }

    // Installs the global recorder before the artifacts are counted.
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    tracing::info!("Loading model artifacts...");
    let artifacts = ModelArtifacts::load(&ArtifactConfig::from(&config))
        .await
        .context("failed to load model artifacts")?;
    let engine = TfidfEngine::new(Arc::new(artifacts));
    tracing::info!(
        n_features = engine.artifacts().vectorizer().n_features(),
        "Model loaded successfully"
    );

    let app = server::router(AppState::new(Arc::new(engine), config.default_model))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server_address())
        .await
        .with_context(|| format!("failed to bind {}", config.server_address()))?;
    tracing::info!("Server running on http://{}", config.server_address());
    tracing::info!("Default model: {}", config.default_model.display_name());

    axum::serve(listener, app).await?;
    Ok(())
}
