use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use sparkify_etl::config::{Config, DatabaseType};
use sparkify_etl::etl::{self, LoadProgress};
use sparkify_etl::{db, logging};

/// Load song metadata and event logs into the Sparkify tables.
///
/// Run `create-tables` first against a fresh database.
#[derive(Parser, Debug)]
#[command(name = "sparkify-etl", version)]
struct CliArgs {
    /// Path to config file. Defaults to $SPARKIFY_CONFIG, then
    /// $XDG_CONFIG_HOME/sparkify/config.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the song metadata tree.
    #[arg(long)]
    song_data: Option<PathBuf>,

    /// Root of the event log tree.
    #[arg(long)]
    log_data: Option<PathBuf>,

    /// Use this SQLite file instead of the configured database.
    #[arg(long)]
    sqlite: Option<PathBuf>,
}

fn print_progress(progress: &LoadProgress) {
    match progress {
        LoadProgress::Started { root, total_files } => {
            println!("{} files found in {}", total_files, root.display());
        }
        LoadProgress::Processed { current, total, .. } => {
            println!("{}/{} files processed.", current, total);
        }
        LoadProgress::Completed { .. } => {}
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(path) = args.song_data {
        config.input.song_data = path;
    }
    if let Some(path) = args.log_data {
        config.input.log_data = path;
    }
    if let Some(path) = args.sqlite {
        config.database.backend = DatabaseType::Sqlite;
        config.database.sqlite_path = path;
    }

    logging::init(config.log_dir.clone())?;

    let mut db = db::open(&config.database)?;
    info!(dialect = db.catalog().dialect, "Connected");

    let (songs, logs) = match etl::run(db.as_mut(), &config.input, &mut print_progress) {
        Ok(summaries) => summaries,
        Err(e) => {
            error!(error = %format!("{e:#}"), "ETL run aborted");
            return Err(e);
        }
    };

    info!(
        song_files = songs.files_processed,
        log_files = logs.files_processed,
        songplays = logs.rows.songplays,
        "ETL run complete"
    );
    for (table, count) in db.table_counts()? {
        info!(table, rows = count, "Table size");
    }

    Ok(())
}
