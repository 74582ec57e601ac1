//! Sparkify ETL: loads song metadata and listening logs from JSON files into
//! a star schema (`songplays` fact table; `users`, `songs`, `artists` and
//! `time` dimensions).
//!
//! Two entry points share this library:
//! - `create-tables` recreates the database and its tables ([`bootstrap`]).
//! - `sparkify-etl` walks the input trees and loads them ([`etl`]).

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod logging;
pub mod models;
