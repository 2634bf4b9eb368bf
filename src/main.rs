use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use streamscribe::{http, AppState, Config, NatsRecognizer, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "streamscribe", version, about = "Real-time streaming transcription server")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/streamscribe")]
    config: String,

    /// Override the HTTP port from the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }

    info!("Streamscribe v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let store = SqliteStore::open(&cfg.storage.database_path)?;

    let engine = NatsRecognizer::connect(
        &cfg.recognizer.nats_url,
        cfg.recognizer.subject_prefix.clone(),
        cfg.recognizer.sample_rate,
        cfg.request_timeout(),
    )
    .await?;

    let state = AppState::new(Arc::new(engine), Arc::new(store), cfg.session_config())
        .with_cors_origins(cfg.service.http.cors_origins.clone())
        .with_service_name(cfg.service.name.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    http::serve(listener, state, shutdown_signal()).await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
