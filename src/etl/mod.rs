pub mod discovery;
pub mod log;
pub mod song;

use anyhow::{Context, Result};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::InputConfig;
use crate::db::Warehouse;

pub use discovery::discover_files;
pub use self::log::process_log_file;
pub use song::process_song_file;

/// Loads one file's rows through the warehouse.
pub type Extractor = fn(&mut dyn Warehouse, &Path) -> Result<RowCounts>;

/// Insert statements issued per table. Conflicting inserts that the catalog
/// ignores are still counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub songs: usize,
    pub artists: usize,
    pub time: usize,
    pub users: usize,
    pub songplays: usize,
}

impl AddAssign for RowCounts {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.time += other.time;
        self.users += other.users;
        self.songplays += other.songplays;
    }
}

#[derive(Debug, Clone)]
pub enum LoadProgress {
    Started { root: PathBuf, total_files: usize },
    Processed { current: usize, total: usize, path: PathBuf },
    Completed { processed: usize, rows: RowCounts },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files_found: usize,
    pub files_processed: usize,
    pub rows: RowCounts,
}

/// Run `extract` over every matching file under `root`, one transaction per
/// file. The first failure rolls back that file and ends the walk; files
/// committed before it stay committed.
pub fn process_data(
    db: &mut dyn Warehouse,
    root: &Path,
    extension: &str,
    extract: Extractor,
    on_progress: &mut dyn FnMut(&LoadProgress),
) -> Result<LoadSummary> {
    let files = discover_files(root, extension)?;

    let total = files.len();
    info!(root = %root.display(), total, "Discovered input files");
    on_progress(&LoadProgress::Started {
        root: root.to_path_buf(),
        total_files: total,
    });

    let mut summary = LoadSummary {
        files_found: total,
        ..LoadSummary::default()
    };

    for (index, path) in files.iter().enumerate() {
        db.begin()?;

        let rows = match extract(db, path) {
            Ok(rows) => rows,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load file");
                if let Err(rollback) = db.rollback() {
                    warn!(error = %rollback, "Rollback failed");
                }
                return Err(e.context(format!("Failed to load {}", path.display())));
            }
        };

        db.commit()
            .with_context(|| format!("Failed to commit {}", path.display()))?;

        summary.files_processed += 1;
        summary.rows += rows;
        on_progress(&LoadProgress::Processed {
            current: index + 1,
            total,
            path: path.clone(),
        });
    }

    on_progress(&LoadProgress::Completed {
        processed: summary.files_processed,
        rows: summary.rows,
    });

    Ok(summary)
}

/// Load the song tree, then the log tree. Songs go first so plays can be
/// resolved against them.
pub fn run(
    db: &mut dyn Warehouse,
    input: &InputConfig,
    on_progress: &mut dyn FnMut(&LoadProgress),
) -> Result<(LoadSummary, LoadSummary)> {
    let songs = process_data(
        db,
        &input.song_data,
        &input.extension,
        process_song_file,
        on_progress,
    )?;
    let logs = process_data(
        db,
        &input.log_data,
        &input.extension,
        process_log_file,
        on_progress,
    )?;
    Ok((songs, logs))
}
