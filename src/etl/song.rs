//! Song metadata files: one JSON record per file, one song and one artist row.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use super::RowCounts;
use crate::db::Warehouse;
use crate::error::ExtractError;
use crate::models::SongRecord;

pub fn parse_song_file(path: &Path) -> Result<SongRecord, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(content.trim()).map_err(|source| ExtractError::Json {
        path: path.to_path_buf(),
        line: source.line(),
        source,
    })
}

pub fn process_song_file(db: &mut dyn Warehouse, path: &Path) -> Result<RowCounts> {
    let record = parse_song_file(path)?;

    db.insert_song(&record.song())?;
    db.insert_artist(&record.artist())?;

    debug!(song_id = %record.song_id, artist_id = %record.artist_id, "Loaded song file");

    Ok(RowCounts {
        songs: 1,
        artists: 1,
        ..RowCounts::default()
    })
}
