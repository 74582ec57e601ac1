use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub input: InputConfig,

    /// Directory for the rolling log file. Logs only go to stderr when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Postgresql,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseType,

    /// Connection string for the pipeline's own database.
    #[serde(default = "default_url")]
    pub url: String,

    /// Connection string for an always-present database, used only to drop
    /// and recreate the target database.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,

    /// Name of the target database created by bootstrap.
    #[serde(default = "default_database_name")]
    pub name: String,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

fn default_url() -> String {
    "host=127.0.0.1 dbname=sparkifydb user=student password=student".to_string()
}

fn default_admin_url() -> String {
    "host=127.0.0.1 dbname=studentdb user=student password=student".to_string()
}

fn default_database_name() -> String {
    "sparkifydb".to_string()
}

fn default_sqlite_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sparkify")
        .join("sparkifydb.sqlite")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseType::default(),
            url: default_url(),
            admin_url: default_admin_url(),
            name: default_database_name(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Root of the song metadata tree (one record per file).
    #[serde(default = "default_song_data")]
    pub song_data: PathBuf,

    /// Root of the event log tree (one record per line).
    #[serde(default = "default_log_data")]
    pub log_data: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_song_data() -> PathBuf {
    PathBuf::from("data/song_data")
}

fn default_log_data() -> PathBuf {
    PathBuf::from("data/log_data")
}

fn default_extension() -> String {
    "json".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            song_data: default_song_data(),
            log_data: default_log_data(),
            extension: default_extension(),
        }
    }
}

impl Config {
    /// Load from `SPARKIFY_CONFIG` or the default location, writing the
    /// defaults out when no file exists yet.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("SPARKIFY_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sparkify")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}
