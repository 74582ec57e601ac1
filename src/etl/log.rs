//! Event log files: one JSON event per line.
//!
//! Only song plays by identified users count. From those the loader writes
//! one time row per distinct timestamp, one user upsert per event, and one
//! songplay per event with its song and artist resolved against the catalog
//! tables when possible.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::RowCounts;
use crate::db::Warehouse;
use crate::error::ExtractError;
use crate::models::{timestamp_from_millis, LogEvent, Songplay, TimeRow, User};

/// An event together with its 1-based line number in the source file.
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    pub line: usize,
    pub event: LogEvent,
}

/// Parse every non-blank line. The first malformed line fails the whole file.
pub fn parse_log_file(path: &Path) -> Result<Vec<LoggedEvent>, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut events = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(raw).map_err(|source| ExtractError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        events.push(LoggedEvent {
            line: index + 1,
            event,
        });
    }

    Ok(events)
}

/// Song plays with a non-empty first name, in file order.
pub fn qualifying_events(events: Vec<LoggedEvent>) -> Vec<LoggedEvent> {
    events
        .into_iter()
        .filter(|logged| logged.event.is_song_play() && logged.event.has_first_name())
        .collect()
}

/// Fully validated rows for one file, built before anything is written.
#[derive(Debug, Default)]
pub struct LogRows {
    pub times: Vec<TimeRow>,
    pub users: Vec<User>,
    /// Songplays still missing their song/artist ids, with the lookup key.
    pub plays: Vec<(Songplay, Option<SongKey>)>,
}

/// Title, artist name and duration of the played song.
#[derive(Debug, Clone, PartialEq)]
pub struct SongKey {
    pub title: String,
    pub artist: String,
    pub length: f64,
}

pub fn build_rows(path: &Path, events: &[LoggedEvent]) -> Result<LogRows, ExtractError> {
    let mut rows = LogRows::default();
    let mut seen_ts = HashSet::new();

    for logged in events {
        let LoggedEvent { line, event } = logged;
        let ts = event.ts.ok_or_else(|| ExtractError::MissingField {
            path: path.to_path_buf(),
            line: *line,
            field: "ts",
        })?;
        let start_time =
            timestamp_from_millis(ts).ok_or_else(|| ExtractError::InvalidTimestamp {
                path: path.to_path_buf(),
                line: *line,
                ts,
            })?;
        let user_id = event.user_id.ok_or_else(|| ExtractError::MissingField {
            path: path.to_path_buf(),
            line: *line,
            field: "userId",
        })?;

        if seen_ts.insert(ts) {
            rows.times.push(TimeRow::from_timestamp(start_time));
        }

        rows.users.push(User {
            user_id,
            first_name: event.first_name.clone().unwrap_or_default(),
            last_name: event.last_name.clone(),
            gender: event.gender.clone(),
            level: event.level.clone(),
        });

        let key = match (&event.song, &event.artist, event.length) {
            (Some(title), Some(artist), Some(length)) => Some(SongKey {
                title: title.clone(),
                artist: artist.clone(),
                length,
            }),
            _ => None,
        };

        rows.plays.push((
            Songplay {
                start_time,
                user_id,
                level: event.level.clone(),
                song_id: None,
                artist_id: None,
                session_id: event.session_id,
                location: event.location.clone(),
                user_agent: event.user_agent.clone(),
            },
            key,
        ));
    }

    Ok(rows)
}

pub fn process_log_file(db: &mut dyn Warehouse, path: &Path) -> Result<RowCounts> {
    let events = parse_log_file(path)?;
    let total = events.len();
    let events = qualifying_events(events);
    let rows = build_rows(path, &events)?;

    for time in &rows.times {
        db.insert_time(time)?;
    }

    for user in &rows.users {
        db.upsert_user(user)?;
    }

    let mut matched = 0;
    for (mut play, key) in rows.plays {
        if let Some(key) = key {
            if let Some((song_id, artist_id)) =
                db.find_song_artist(&key.title, &key.artist, key.length)?
            {
                play.song_id = Some(song_id);
                play.artist_id = Some(artist_id);
                matched += 1;
            }
        }
        db.insert_songplay(&play)?;
    }

    debug!(
        path = %path.display(),
        events = total,
        plays = events.len(),
        matched,
        "Loaded log file"
    );

    Ok(RowCounts {
        time: rows.times.len(),
        users: rows.users.len(),
        songplays: events.len(),
        ..RowCounts::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn event(page: &str, first_name: Option<&str>, user_id: &str, level: &str, ts: i64) -> String {
        let first_name = match first_name {
            Some(name) => format!("\"{name}\""),
            None => "null".to_string(),
        };
        format!(
            r#"{{"artist":"Artist One","auth":"Logged In","firstName":{first_name},"gender":"F","itemInSession":0,"lastName":"Koch","length":200.5,"level":"{level}","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"PUT","page":"{page}","registration":1541048010796.0,"sessionId":818,"song":"Song One","status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"{user_id}"}}"#
        )
    }

    fn write_log(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_filters_non_plays_and_anonymous_events() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "2018-11-01-events.json",
            &[
                event("Home", Some("Lily"), "15", "free", 1_000),
                event("NextSong", None, "", "free", 2_000),
                event("NextSong", Some(""), "", "free", 3_000),
                event("NextSong", Some("Lily"), "15", "free", 4_000),
                event("Logout", Some("Lily"), "15", "free", 5_000),
            ],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].line, 4);
        assert_eq!(events[0].event.ts, Some(4_000));
    }

    #[test]
    fn test_time_rows_first_timestamp_wins() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[
                event("NextSong", Some("Lily"), "15", "free", 1_541_106_106_796),
                event("NextSong", Some("Kaylee"), "8", "free", 1_541_106_106_796),
                event("NextSong", Some("Lily"), "15", "paid", 1_541_106_352_796),
            ],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let rows = build_rows(&path, &events).unwrap();

        assert_eq!(rows.times.len(), 2);
        assert_eq!(rows.users.len(), 3);
        assert_eq!(rows.plays.len(), 3);
        assert_eq!(rows.times[0].hour, 21);
        assert_eq!(
            rows.plays[0].1,
            Some(SongKey {
                title: "Song One".to_string(),
                artist: "Artist One".to_string(),
                length: 200.5,
            })
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[
                event("NextSong", Some("Lily"), "15", "free", 1_000),
                String::new(),
                event("NextSong", Some("Lily"), "15", "free", 2_000),
                String::new(),
            ],
        );

        let events = parse_log_file(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].line, 3);
    }

    #[test]
    fn test_malformed_line_reports_its_number() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[
                event("NextSong", Some("Lily"), "15", "free", 1_000),
                "{\"page\": \"NextSong\", ".to_string(),
            ],
        );

        match parse_log_file(&path).unwrap_err() {
            ExtractError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_qualifying_event_without_user_id_fails() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[event("NextSong", Some("Lily"), "", "free", 1_000)],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let err = build_rows(&path, &events).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { field: "userId", line: 1, .. }));
    }

    #[test]
    fn test_non_play_without_ts_is_discarded() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[
                r#"{"page":"Home","firstName":"Lily","userId":"15","level":"free"}"#.to_string(),
                event("NextSong", Some("Lily"), "15", "free", 1_000),
            ],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let rows = build_rows(&path, &events).unwrap();
        assert_eq!(rows.times.len(), 1);
        assert_eq!(rows.plays.len(), 1);
    }

    #[test]
    fn test_qualifying_event_without_ts_fails() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[r#"{"page":"NextSong","firstName":"Lily","userId":"15","level":"free"}"#.to_string()],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let err = build_rows(&path, &events).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField { field: "ts", line: 1, .. }));
    }

    #[test]
    fn test_whitespace_first_name_still_counts() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[event("NextSong", Some(" "), "15", "free", 1_000)],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let rows = build_rows(&path, &events).unwrap();
        assert_eq!(rows.users.len(), 1);
        assert_eq!(rows.users[0].first_name, " ");
    }

    #[test]
    fn test_event_without_song_has_no_lookup_key() {
        let dir = tempdir().unwrap();
        let path = write_log(
            dir.path(),
            "events.json",
            &[r#"{"page":"NextSong","firstName":"Lily","userId":"15","ts":1000,"level":"free"}"#
                .to_string()],
        );

        let events = qualifying_events(parse_log_file(&path).unwrap());
        let rows = build_rows(&path, &events).unwrap();
        assert_eq!(rows.plays.len(), 1);
        assert_eq!(rows.plays[0].1, None);
    }
}
