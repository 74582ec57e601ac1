//! Destructive schema setup: recreate the target database, then drop and
//! create every table from the backend's catalog.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::{self, Warehouse};

/// Recreate the database and its tables, returning a connection to it.
pub fn run(config: &DatabaseConfig) -> Result<Box<dyn Warehouse>> {
    let mut db = db::recreate(config)?;
    info!(dialect = db.catalog().dialect, "Connected to fresh database");

    drop_tables(db.as_mut())?;
    create_tables(db.as_mut())?;

    Ok(db)
}

pub fn drop_tables(db: &mut dyn Warehouse) -> Result<()> {
    for sql in db.catalog().drop_tables {
        db.execute_batch(sql)
            .with_context(|| format!("Failed to run: {sql}"))?;
    }
    info!("Dropped tables");
    Ok(())
}

pub fn create_tables(db: &mut dyn Warehouse) -> Result<()> {
    for sql in db.catalog().create_tables {
        db.execute_batch(sql)
            .with_context(|| format!("Failed to run: {}", sql.trim()))?;
    }
    info!("Created tables");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseType;
    use crate::db::catalog::TABLES;
    use tempfile::tempdir;

    fn sqlite_config(dir: &std::path::Path) -> DatabaseConfig {
        DatabaseConfig {
            backend: DatabaseType::Sqlite,
            sqlite_path: dir.join("sparkify.sqlite"),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_bootstrap_creates_empty_tables() {
        let dir = tempdir().unwrap();
        let mut db = run(&sqlite_config(dir.path())).unwrap();

        let counts = db.table_counts().unwrap();
        assert_eq!(counts.len(), TABLES.len());
        assert!(counts.iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn test_bootstrap_discards_previous_rows() {
        let dir = tempdir().unwrap();
        let config = sqlite_config(dir.path());

        let mut db = run(&config).unwrap();
        db.execute_batch("INSERT INTO users (user_id, first_name) VALUES (1, 'Ann')")
            .unwrap();
        assert_eq!(db.count_rows("users").unwrap(), 1);
        drop(db);

        let mut db = run(&config).unwrap();
        assert_eq!(db.count_rows("users").unwrap(), 0);
    }

    #[test]
    fn test_drop_tables_is_repeatable() {
        let dir = tempdir().unwrap();
        let mut db = run(&sqlite_config(dir.path())).unwrap();

        drop_tables(db.as_mut()).unwrap();
        drop_tables(db.as_mut()).unwrap();
        assert!(db.count_rows("songs").is_err());

        create_tables(db.as_mut()).unwrap();
        assert_eq!(db.count_rows("songs").unwrap(), 0);
    }
}
