//! Storage abstraction shared by the PostgreSQL and SQLite backends.
//!
//! A backend owns one long-lived connection and the [`SqlCatalog`] for its
//! dialect. Callers drive it strictly sequentially.

use anyhow::Result;

use super::catalog::{SqlCatalog, TABLES};
use crate::models::{Artist, Song, Songplay, TimeRow, User};

pub trait Warehouse {
    /// Statements for this backend's dialect.
    fn catalog(&self) -> &'static SqlCatalog;

    /// Run one or more statements without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    fn begin(&mut self) -> Result<()> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }

    fn insert_song(&mut self, song: &Song) -> Result<()>;

    fn insert_artist(&mut self, artist: &Artist) -> Result<()>;

    /// Ignored when a row for the same `start_time` already exists.
    fn insert_time(&mut self, time: &TimeRow) -> Result<()>;

    /// Replaces every attribute of an existing user with the same id.
    fn upsert_user(&mut self, user: &User) -> Result<()>;

    fn insert_songplay(&mut self, play: &Songplay) -> Result<()>;

    /// Resolve `(song_id, artist_id)` by exact title, artist name and duration.
    fn find_song_artist(
        &mut self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>>;

    fn count_rows(&mut self, table: &str) -> Result<i64>;

    fn table_counts(&mut self) -> Result<Vec<(&'static str, i64)>> {
        TABLES
            .iter()
            .map(|&table| self.count_rows(table).map(|count| (table, count)))
            .collect()
    }
}
