//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipsum_analysis::ComputeBackend;
use clipsum_media::{check_ffmpeg, check_ffprobe, check_ytdlp, CaptureBackend};
use clipsum_pipeline::{build_models, ClipPipeline, ModelConfig, PipelineConfig};

use clipsum_api::{create_router, metrics, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing()?;

    info!("Starting clipsum-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    let pipeline_config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
    let model_config = ModelConfig::from_env().context("Invalid model configuration")?;

    let capture_backend = pipeline_config.capture_backend;
    let mut binaries = vec![("yt-dlp", check_ytdlp())];
    if capture_backend == CaptureBackend::Ffmpeg {
        binaries.push(("ffmpeg", check_ffmpeg()));
        binaries.push(("ffprobe", check_ffprobe()));
    }
    for (name, found) in binaries {
        if let Err(e) = found {
            warn!(binary = name, "{}", e);
        }
    }

    let backend = ComputeBackend::detect();

    let (vision, reasoning) =
        build_models(&model_config, backend).context("Failed to create model handles")?;
    let pipeline = ClipPipeline::from_config(&pipeline_config, vision, reasoning)
        .context("Failed to create clip pipeline")?;
    pipeline
        .frame_store()
        .ensure_dir()
        .await
        .context("Failed to create frames directory")?;

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    let state = AppState::new(config, pipeline).with_capture_backend(capture_backend);
    let app = create_router(state, metrics_handle);

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("clipsum=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
