use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use tracing_subscriber::EnvFilter;

use iriscope_onnx::OnnxSegmenter;
use iriscope_server::{AppState, Config, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    // A model that cannot load or warm up must fail startup, not the
    // first request.
    tracing::info!(model_path = %config.model_path, "loading segmentation model");
    let model = OnnxSegmenter::load_and_warmup(&config.model_path)
        .with_context(|| format!("failed to initialize model from {}", config.model_path))?;
    tracing::info!("model loaded and warmed up");

    let state = AppState::new(Arc::new(model), config.model_path.clone());
    let router = app(state, &config.origins());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router)
        .await
        .context("server error")?;
    Ok(())
}
