//! SQLite backend implementation.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::backend::Warehouse;
use super::catalog::{SqlCatalog, SQLITE};
use crate::models::{Artist, Song, Songplay, TimeRow, User};

pub struct SqliteDb {
    pub(crate) conn: Connection,
    catalog: &'static SqlCatalog,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        Ok(Self {
            conn,
            catalog: &SQLITE,
        })
    }

    /// Delete the database file, if any, and open a fresh one in its place.
    pub fn recreate(path: &Path) -> Result<Self> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            tracing::info!(path = %path.display(), "Removed existing database");
        }
        Self::open(path)
    }
}

impl Warehouse for SqliteDb {
    fn catalog(&self) -> &'static SqlCatalog {
        self.catalog
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn insert_song(&mut self, song: &Song) -> Result<()> {
        self.conn
            .execute(
                self.catalog.song_insert,
                params![song.song_id, song.title, song.artist_id, song.year, song.duration],
            )
            .with_context(|| format!("Failed to insert song {}", song.song_id))?;
        Ok(())
    }

    fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        self.conn
            .execute(
                self.catalog.artist_insert,
                params![
                    artist.artist_id,
                    artist.name,
                    artist.location,
                    artist.latitude,
                    artist.longitude
                ],
            )
            .with_context(|| format!("Failed to insert artist {}", artist.artist_id))?;
        Ok(())
    }

    fn insert_time(&mut self, time: &TimeRow) -> Result<()> {
        self.conn
            .execute(
                self.catalog.time_insert,
                params![
                    time.start_time,
                    time.hour,
                    time.day,
                    time.week,
                    time.month,
                    time.year,
                    time.weekday
                ],
            )
            .with_context(|| format!("Failed to insert time {}", time.start_time))?;
        Ok(())
    }

    fn upsert_user(&mut self, user: &User) -> Result<()> {
        self.conn
            .execute(
                self.catalog.user_insert,
                params![
                    user.user_id,
                    user.first_name,
                    user.last_name,
                    user.gender,
                    user.level
                ],
            )
            .with_context(|| format!("Failed to upsert user {}", user.user_id))?;
        Ok(())
    }

    fn insert_songplay(&mut self, play: &Songplay) -> Result<()> {
        self.conn
            .execute(
                self.catalog.songplay_insert,
                params![
                    play.start_time,
                    play.user_id,
                    play.level,
                    play.song_id,
                    play.artist_id,
                    play.session_id,
                    play.location,
                    play.user_agent
                ],
            )
            .context("Failed to insert songplay")?;
        Ok(())
    }

    fn find_song_artist(
        &mut self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        let ids = self
            .conn
            .query_row(
                self.catalog.song_select,
                params![title, artist_name, duration],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(ids)
    }

    fn count_rows(&mut self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp_from_millis;
    use tempfile::tempdir;

    fn schema(db: &mut SqliteDb) {
        for sql in db.catalog().create_tables {
            db.execute_batch(sql).unwrap();
        }
    }

    fn user(level: &str) -> User {
        User {
            user_id: 15,
            first_name: "Lily".to_string(),
            last_name: Some("Koch".to_string()),
            gender: Some("F".to_string()),
            level: Some(level.to_string()),
        }
    }

    #[test]
    fn test_recreate_discards_existing_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db").join("etl.sqlite");

        let mut db = SqliteDb::open(&path).unwrap();
        schema(&mut db);
        db.upsert_user(&user("free")).unwrap();
        drop(db);

        let mut db = SqliteDb::recreate(&path).unwrap();
        assert!(db.count_rows("users").is_err());
        schema(&mut db);
        assert_eq!(db.count_rows("users").unwrap(), 0);
    }

    #[test]
    fn test_user_upsert_last_write_wins() {
        let dir = tempdir().unwrap();
        let mut db = SqliteDb::open(&dir.path().join("etl.sqlite")).unwrap();
        schema(&mut db);

        db.upsert_user(&user("free")).unwrap();
        db.upsert_user(&user("paid")).unwrap();

        assert_eq!(db.count_rows("users").unwrap(), 1);
        let level: String = db
            .conn
            .query_row("SELECT level FROM users WHERE user_id = 15", [], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "paid");
    }

    #[test]
    fn test_time_insert_ignores_duplicates() {
        let dir = tempdir().unwrap();
        let mut db = SqliteDb::open(&dir.path().join("etl.sqlite")).unwrap();
        schema(&mut db);

        let row = TimeRow::from_timestamp(timestamp_from_millis(1_541_106_106_796).unwrap());
        db.insert_time(&row).unwrap();
        db.insert_time(&row).unwrap();

        assert_eq!(db.count_rows("time").unwrap(), 1);
    }

    #[test]
    fn test_find_song_artist_requires_exact_match() {
        let dir = tempdir().unwrap();
        let mut db = SqliteDb::open(&dir.path().join("etl.sqlite")).unwrap();
        schema(&mut db);

        db.insert_song(&Song {
            song_id: "S1".to_string(),
            title: "Song One".to_string(),
            artist_id: "A1".to_string(),
            year: 2001,
            duration: 200.5,
        })
        .unwrap();
        db.insert_artist(&Artist {
            artist_id: "A1".to_string(),
            name: "Artist One".to_string(),
            location: None,
            latitude: None,
            longitude: None,
        })
        .unwrap();

        assert_eq!(
            db.find_song_artist("Song One", "Artist One", 200.5).unwrap(),
            Some(("S1".to_string(), "A1".to_string()))
        );
        assert_eq!(db.find_song_artist("Song One", "Artist One", 200.4).unwrap(), None);
        assert_eq!(db.find_song_artist("Song One", "Someone", 200.5).unwrap(), None);
    }

    #[test]
    fn test_rollback_discards_uncommitted_rows() {
        let dir = tempdir().unwrap();
        let mut db = SqliteDb::open(&dir.path().join("etl.sqlite")).unwrap();
        schema(&mut db);

        db.begin().unwrap();
        db.upsert_user(&user("free")).unwrap();
        db.rollback().unwrap();
        assert_eq!(db.count_rows("users").unwrap(), 0);

        db.begin().unwrap();
        db.upsert_user(&user("free")).unwrap();
        db.commit().unwrap();
        assert_eq!(db.count_rows("users").unwrap(), 1);
    }
}
