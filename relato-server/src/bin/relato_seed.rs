//! relato-seed - Replace database contents with demo data

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use relato_common::config::TomlConfig;
use relato_common::db::init_database;
use relato_server::seed::seed_database;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "relato-seed")]
#[command(about = "Wipe the relato database and load demo users, topics and reports")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "RELATO_CONFIG")]
    config: Option<PathBuf>,

    /// Database file (overrides config file)
    #[arg(short, long, env = "RELATO_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let db_path = args.database.unwrap_or(config.database_path);

    info!("Seeding database: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let summary = seed_database(&pool).await.context("Seeding failed")?;
    info!(
        "Seeding finished: {} users, {} topics, {} reports, {} feedback entries",
        summary.users, summary.topics, summary.reports, summary.feedback
    );

    pool.close().await;
    Ok(())
}
