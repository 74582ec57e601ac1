//! PostgreSQL backend implementation.

use anyhow::{Context, Result};
use postgres::{Client, NoTls};

use super::backend::Warehouse;
use super::catalog::{SqlCatalog, POSTGRES};
use crate::models::{Artist, Song, Songplay, TimeRow, User};

pub struct PgDb {
    client: Client,
    catalog: &'static SqlCatalog,
}

/// Quote an identifier for statements that cannot take it as a parameter.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl PgDb {
    pub fn open(url: &str) -> Result<Self> {
        let client =
            Client::connect(url, NoTls).with_context(|| "Failed to connect to PostgreSQL")?;
        Ok(Self {
            client,
            catalog: &POSTGRES,
        })
    }

    /// Drop and recreate database `name` through the administrative
    /// connection, then connect to the new database.
    pub fn recreate(admin_url: &str, url: &str, name: &str) -> Result<Self> {
        let mut admin = Client::connect(admin_url, NoTls)
            .with_context(|| "Failed to connect to the administrative database")?;

        // DROP/CREATE DATABASE refuse to run inside a transaction block, so
        // each goes out as its own simple query.
        let db_name = quote_ident(name);
        admin
            .batch_execute(&format!("DROP DATABASE IF EXISTS {db_name}"))
            .with_context(|| format!("Failed to drop database {name}"))?;
        admin
            .batch_execute(&format!(
                "CREATE DATABASE {db_name} WITH ENCODING 'utf8' TEMPLATE template0"
            ))
            .with_context(|| format!("Failed to create database {name}"))?;
        admin.close()?;
        tracing::info!(database = %name, "Recreated database");

        Self::open(url)
    }
}

impl Warehouse for PgDb {
    fn catalog(&self) -> &'static SqlCatalog {
        self.catalog
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn insert_song(&mut self, song: &Song) -> Result<()> {
        self.client
            .execute(
                self.catalog.song_insert,
                &[&song.song_id, &song.title, &song.artist_id, &song.year, &song.duration],
            )
            .with_context(|| format!("Failed to insert song {}", song.song_id))?;
        Ok(())
    }

    fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        self.client
            .execute(
                self.catalog.artist_insert,
                &[
                    &artist.artist_id,
                    &artist.name,
                    &artist.location,
                    &artist.latitude,
                    &artist.longitude,
                ],
            )
            .with_context(|| format!("Failed to insert artist {}", artist.artist_id))?;
        Ok(())
    }

    fn insert_time(&mut self, time: &TimeRow) -> Result<()> {
        self.client
            .execute(
                self.catalog.time_insert,
                &[
                    &time.start_time,
                    &time.hour,
                    &time.day,
                    &time.week,
                    &time.month,
                    &time.year,
                    &time.weekday,
                ],
            )
            .with_context(|| format!("Failed to insert time {}", time.start_time))?;
        Ok(())
    }

    fn upsert_user(&mut self, user: &User) -> Result<()> {
        self.client
            .execute(
                self.catalog.user_insert,
                &[
                    &user.user_id,
                    &user.first_name,
                    &user.last_name,
                    &user.gender,
                    &user.level,
                ],
            )
            .with_context(|| format!("Failed to upsert user {}", user.user_id))?;
        Ok(())
    }

    fn insert_songplay(&mut self, play: &Songplay) -> Result<()> {
        self.client
            .execute(
                self.catalog.songplay_insert,
                &[
                    &play.start_time,
                    &play.user_id,
                    &play.level,
                    &play.song_id,
                    &play.artist_id,
                    &play.session_id,
                    &play.location,
                    &play.user_agent,
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
        let row = self
            .client
            .query_opt(self.catalog.song_select, &[&title, &artist_name, &duration])?;
        Ok(row.map(|row| (row.get(0), row.get(1))))
    }

    fn count_rows(&mut self, table: &str) -> Result<i64> {
        let row = self
            .client
            .query_one(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), &[])?;
        Ok(row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("sparkifydb"), "\"sparkifydb\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
