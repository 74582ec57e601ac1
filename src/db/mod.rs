pub mod backend;
pub mod catalog;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

use anyhow::Result;

pub use backend::Warehouse;

use crate::config::{DatabaseConfig, DatabaseType};

/// Connect to the pipeline's target database.
pub fn open(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    match config.backend {
        DatabaseType::Postgresql => open_postgres(config),
        DatabaseType::Sqlite => {
            tracing::debug!(path = %config.sqlite_path.display(), "Opening SQLite database");
            Ok(Box::new(sqlite::SqliteDb::open(&config.sqlite_path)?))
        }
    }
}

/// Destroy the target database, create it empty and connect to it.
pub fn recreate(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    match config.backend {
        DatabaseType::Postgresql => recreate_postgres(config),
        DatabaseType::Sqlite => Ok(Box::new(sqlite::SqliteDb::recreate(&config.sqlite_path)?)),
    }
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    Ok(Box::new(postgres::PgDb::open(&config.url)?))
}

#[cfg(feature = "postgres")]
fn recreate_postgres(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    let db = postgres::PgDb::recreate(&config.admin_url, &config.url, &config.name)?;
    Ok(Box::new(db))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    anyhow::bail!("PostgreSQL backend not compiled in (enable the `postgres` feature)")
}

#[cfg(not(feature = "postgres"))]
fn recreate_postgres(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    open_postgres(config)
}
