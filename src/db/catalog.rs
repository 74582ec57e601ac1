//! Named SQL statements, one catalog per backend dialect.
//!
//! The bootstrap and the loaders never hold SQL text of their own: they reach
//! the statements through the catalog their backend was opened with. Column
//! order of each insert matches the field order of the row struct bound to it.

/// The five tables, in drop/create order.
pub const TABLES: [&str; 5] = ["songplays", "users", "songs", "artists", "time"];

#[derive(Debug)]
pub struct SqlCatalog {
    pub dialect: &'static str,
    pub drop_tables: [&'static str; 5],
    pub create_tables: [&'static str; 5],
    pub songplay_insert: &'static str,
    pub user_insert: &'static str,
    pub song_insert: &'static str,
    pub artist_insert: &'static str,
    pub time_insert: &'static str,
    /// `(title, artist name, duration)` to `(song_id, artist_id)`.
    pub song_select: &'static str,
}

pub static POSTGRES: SqlCatalog = SqlCatalog {
    dialect: "postgresql",
    drop_tables: [
        "DROP TABLE IF EXISTS songplays",
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS songs",
        "DROP TABLE IF EXISTS artists",
        "DROP TABLE IF EXISTS time",
    ],
    create_tables: [
        r#"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id SERIAL PRIMARY KEY,
            start_time TIMESTAMP NOT NULL,
            user_id BIGINT NOT NULL,
            level VARCHAR,
            song_id VARCHAR,
            artist_id VARCHAR,
            session_id BIGINT,
            location VARCHAR,
            user_agent VARCHAR
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id BIGINT PRIMARY KEY,
            first_name VARCHAR NOT NULL,
            last_name VARCHAR,
            gender VARCHAR,
            level VARCHAR
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id VARCHAR PRIMARY KEY,
            title VARCHAR NOT NULL,
            artist_id VARCHAR NOT NULL,
            year INT,
            duration DOUBLE PRECISION NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id VARCHAR PRIMARY KEY,
            name VARCHAR NOT NULL,
            location VARCHAR,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS time (
            start_time TIMESTAMP PRIMARY KEY,
            hour INT NOT NULL,
            day INT NOT NULL,
            week INT NOT NULL,
            month INT NOT NULL,
            year INT NOT NULL,
            weekday INT NOT NULL
        )
        "#,
    ],
    songplay_insert: "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    user_insert: "INSERT INTO users (user_id, first_name, last_name, gender, level)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id) DO UPDATE SET
             first_name = EXCLUDED.first_name,
             last_name = EXCLUDED.last_name,
             gender = EXCLUDED.gender,
             level = EXCLUDED.level",
    song_insert: "INSERT INTO songs (song_id, title, artist_id, year, duration)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (song_id) DO NOTHING",
    artist_insert: "INSERT INTO artists (artist_id, name, location, latitude, longitude)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (artist_id) DO NOTHING",
    time_insert: "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (start_time) DO NOTHING",
    song_select: "SELECT s.song_id, a.artist_id
         FROM songs s
         JOIN artists a ON s.artist_id = a.artist_id
         WHERE s.title = $1 AND a.name = $2 AND s.duration = $3
         LIMIT 1",
};

pub static SQLITE: SqlCatalog = SqlCatalog {
    dialect: "sqlite",
    drop_tables: [
        "DROP TABLE IF EXISTS songplays",
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS songs",
        "DROP TABLE IF EXISTS artists",
        "DROP TABLE IF EXISTS time",
    ],
    create_tables: [
        r#"
        CREATE TABLE IF NOT EXISTS songplays (
            songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            level TEXT,
            song_id TEXT,
            artist_id TEXT,
            session_id INTEGER,
            location TEXT,
            user_agent TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT,
            gender TEXT,
            level TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist_id TEXT NOT NULL,
            year INTEGER,
            duration REAL NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            location TEXT,
            latitude REAL,
            longitude REAL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS time (
            start_time TEXT PRIMARY KEY,
            hour INTEGER NOT NULL,
            day INTEGER NOT NULL,
            week INTEGER NOT NULL,
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            weekday INTEGER NOT NULL
        )
        "#,
    ],
    songplay_insert: "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    user_insert: "INSERT INTO users (user_id, first_name, last_name, gender, level)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id) DO UPDATE SET
             first_name = excluded.first_name,
             last_name = excluded.last_name,
             gender = excluded.gender,
             level = excluded.level",
    song_insert: "INSERT INTO songs (song_id, title, artist_id, year, duration)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (song_id) DO NOTHING",
    artist_insert: "INSERT INTO artists (artist_id, name, location, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (artist_id) DO NOTHING",
    time_insert: "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (start_time) DO NOTHING",
    song_select: "SELECT s.song_id, a.artist_id
         FROM songs s
         JOIN artists a ON s.artist_id = a.artist_id
         WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
         LIMIT 1",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_cover_every_operation() {
        for catalog in [&POSTGRES, &SQLITE] {
            for (table, (drop, create)) in TABLES
                .iter()
                .zip(catalog.drop_tables.iter().zip(catalog.create_tables.iter()))
            {
                assert!(drop.ends_with(table), "{}: {drop}", catalog.dialect);
                assert!(
                    create.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                    "{}: {create}",
                    catalog.dialect
                );
            }
        }
    }

    #[test]
    fn test_conflict_policies() {
        for catalog in [&POSTGRES, &SQLITE] {
            assert!(catalog.user_insert.contains("DO UPDATE SET"));
            assert!(catalog.time_insert.contains("DO NOTHING"));
            assert!(catalog.song_insert.contains("DO NOTHING"));
            assert!(catalog.artist_insert.contains("DO NOTHING"));
            assert!(!catalog.songplay_insert.contains("ON CONFLICT"));
        }
    }
}
