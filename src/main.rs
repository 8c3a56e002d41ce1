use anyhow::{Context, Result};
use clap::Parser;
use remap_gateway::api::{create_router, AppState};
use remap_gateway::config::{load_config, GatewayConfig};
use remap_gateway::store::DocumentStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "remap-gateway")]
#[command(about = "Authenticated gateway for telemetry events, uploads and task lists")]
#[command(version)]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:8080
    listen_addr: String,

    /// Document store address (data directory)
    store_addr: String,

    /// Database name within the store
    db_name: String,

    /// Shared API key every client must present
    api_key: String,

    /// Optional TOML file with gateway tunables
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remap_gateway=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let path = path.to_string_lossy();
            load_config(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?
        }
        None => GatewayConfig::default(),
    };
    config.limits.apply_env();

    let store = match DocumentStore::connect(
        &args.store_addr,
        &args.db_name,
        config.store.connect_timeout(),
    )
    .await
    {
        Ok(store) => store,
        Err(e) => {
            error!(store_addr = %args.store_addr, error = %e, "Could not connect to document store");
            std::process::exit(1);
        }
    };
    info!(path = %store.path().display(), "Document store ready");

    let state = AppState::from_config(store, &args.api_key, &config)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen_addr))?;
    info!(listen_addr = %args.listen_addr, "Listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
