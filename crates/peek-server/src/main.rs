//! # peekd
//!
//! Serves the federation `/peek` endpoint backed by the in-memory room
//! server. Rooms come from a JSON seed file; peek grants live for the life of
//! the process.

use clap::Parser;
use peek_api::{AppState, build_router};
use peek_federation::{PeekService, RoomVersion};
use peek_roomserver::{RoomServer, seed::read_seed_file};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::broadcast::error::RecvError};

#[derive(Debug, Parser)]
#[command(name = "peekd", version, about = "Federation peek endpoint")]
struct Cli {
    /// Config file to load instead of ./config.{toml,yaml,json}.
    #[arg(short, long, env = "PEEK_CONFIG")]
    config: Option<String>,

    /// Room seed file; overrides `roomserver.seed_file`.
    #[arg(long)]
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = peek_common::config::load(cli.config.as_deref())?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peek=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("Starting peekd v{} as {}", env!("CARGO_PKG_VERSION"), config.server.name);

    // === Room server ===
    let supported: Vec<RoomVersion> = config
        .federation
        .supported_room_versions
        .iter()
        .map(|v| RoomVersion::from(v.as_str()))
        .collect();
    tracing::info!("Supported room versions: {:?}", config.federation.supported_room_versions);

    let room_server = RoomServer::new(supported, config.roomserver.peek_renewal_interval_ms);
    match cli.seed.as_deref().or(config.roomserver.seed_file.as_deref()) {
        Some(path) => {
            let seeds = read_seed_file(path).await?;
            room_server.load_seeds(seeds).await?;
        }
        None => tracing::warn!("No room seed file configured; room server starts empty"),
    }

    // Log every new or renewed peek grant.
    let mut inbound = room_server.subscribe();
    tokio::spawn(async move {
        loop {
            match inbound.recv().await {
                Ok(peek) => tracing::debug!(
                    "Peek grant {:?}: {} on {} until {}",
                    peek.grant,
                    peek.peek.server_name,
                    peek.peek.room_id,
                    peek.peek.expires_at()
                ),
                Err(RecvError::Lagged(n)) => tracing::warn!("Peek log lagged by {} grants", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // === Federation API ===
    let state = AppState {
        server_name: config.server.name.clone(),
        peek: PeekService::new(Arc::new(room_server.clone()), Arc::new(room_server)),
    };
    let router = build_router(state, Duration::from_secs(config.federation.request_timeout_secs));
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("Federation API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
