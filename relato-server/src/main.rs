//! relato-server - Incident reporting and triage service
//!
//! Loads bootstrap config, opens (creating if needed) the SQLite database,
//! resolves the token signing secret and serves the REST API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use relato_common::auth::resolve_token_secret;
use relato_common::config::TomlConfig;
use relato_common::db::init_database;
use relato_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for relato-server
#[derive(Parser, Debug)]
#[command(name = "relato-server")]
#[command(about = "Incident reporting and triage service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "RELATO_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "RELATO_PORT")]
    port: Option<u16>,

    /// Database file (overrides config file)
    #[arg(short, long, env = "RELATO_DATABASE")]
    database: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(short, long, env = "RELATO_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "relato_server={level},relato_common={level},tower_http={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting relato-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let token_secret = resolve_token_secret(&pool, config.token_secret.as_deref())
        .await
        .context("Failed to resolve token secret")?;
    if config.token_secret.is_some() {
        info!("Using token secret from config file");
    } else {
        info!("Using token secret from database");
    }

    let state = AppState::new(pool, token_secret, config.token_ttl_seconds);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_address, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("relato-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
