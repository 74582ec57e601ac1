//! Recreate the Sparkify database and its five tables.
//!
//! Destructive: the target database is dropped first, so every row loaded by
//! previous runs is lost.
//!
//! ## Usage
//!
//! ```bash
//! create-tables                       # use the configured database
//! create-tables --sqlite ./etl.sqlite # scratch SQLite file
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use sparkify_etl::config::{Config, DatabaseType};
use sparkify_etl::{bootstrap, logging};

/// Drop and recreate the Sparkify database and tables.
#[derive(Parser, Debug)]
#[command(name = "create-tables", version)]
struct CliArgs {
    /// Path to config file. Defaults to $SPARKIFY_CONFIG, then
    /// $XDG_CONFIG_HOME/sparkify/config.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recreate this SQLite file instead of the configured database.
    #[arg(long)]
    sqlite: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(path) = args.sqlite {
        config.database.backend = DatabaseType::Sqlite;
        config.database.sqlite_path = path;
    }

    logging::init(config.log_dir.clone())?;

    info!(backend = ?config.database.backend, "Bootstrapping database");
    let mut db = bootstrap::run(&config.database)?;

    for (table, count) in db.table_counts()? {
        info!(table, rows = count, "Table ready");
    }

    Ok(())
}
