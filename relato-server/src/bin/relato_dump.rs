//! relato-dump - Write the domain tables as SQL INSERT statements

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use relato_common::config::TomlConfig;
use relato_common::db::init_database;
use relato_server::db::dump::dump_sql;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "relato-dump")]
#[command(about = "Dump users, topics, reports and feedback to an SQL file")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "RELATO_CONFIG")]
    config: Option<PathBuf>,

    /// Database file (overrides config file)
    #[arg(short, long, env = "RELATO_DATABASE")]
    database: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "dev_db.sql")]
    output: PathBuf,
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

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let sql = dump_sql(&pool).await.context("Dump failed")?;
    std::fs::write(&args.output, sql)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!("Database dump created at {}", args.output.display());

    pool.close().await;
    Ok(())
}
