mod db;
mod engine;
mod error;
mod models;
mod reconcile;
mod run;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }

    let db_path = get_db_path()?;
    let mut db = db::Database::open(&db_path)?;
    run::as_cli(&args, &mut db)
}

/// Log to stderr so command output on stdout stays clean. Integrity alarms
/// are on by default.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WALLETKEEPER_LOG")
                .unwrap_or_else(|_| "walletkeeper=warn,integrity=error".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn get_db_path() -> Result<std::path::PathBuf> {
    if let Some(path) = std::env::var_os("WALLETKEEPER_DB") {
        return Ok(path.into());
    }
    let proj_dirs = directories::ProjectDirs::from("com", "walletkeeper", "walletkeeper")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("walletkeeper.db"))
}
