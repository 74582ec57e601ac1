//! Errors raised while turning an input file into rows.
//!
//! Database failures stay as `anyhow::Error` with context attached by the
//! backend; everything that can go wrong before a statement is issued is one
//! of these variants.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {} at line {line}: {source}", .path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} line {line}: qualifying event has no {field}", .path.display())]
    MissingField {
        path: PathBuf,
        line: usize,
        field: &'static str,
    },

    #[error("{} line {line}: timestamp {ts} is out of range", .path.display())]
    InvalidTimestamp { path: PathBuf, line: usize, ts: i64 },
}
