use super::files::atomic_write;
use crate::report::DEFAULT_TRAILING_DAYS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

/// User settings stored in config.json inside the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task table, relative to the data directory
    pub csv_file: String,
    /// Directory for reports, previews and the event log
    pub exports_dir: String,
    /// Event log file name inside `exports_dir`
    pub log_file: String,
    pub report_days: i64,
    pub history_limit: usize,
    pub author_name: String,
    /// Default tracing level when neither --log-level nor RUST_LOG is set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_file: "task_log.csv".to_string(),
            exports_dir: "exports".to_string(),
            log_file: "task_history.log".to_string(),
            report_days: DEFAULT_TRAILING_DAYS,
            history_limit: 25,
            author_name: "[InsertName]".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Concrete file locations derived from a data directory and its config
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub csv_file: PathBuf,
    pub exports_dir: PathBuf,
    pub event_log: PathBuf,
    pub logs_dir: PathBuf,
}

impl Paths {
    pub fn new(data_dir: &Path, config: &Config) -> Self {
        let exports_dir = data_dir.join(&config.exports_dir);
        Self {
            data_dir: data_dir.to_path_buf(),
            csv_file: data_dir.join(&config.csv_file),
            event_log: exports_dir.join(&config.log_file),
            exports_dir,
            logs_dir: data_dir.join("logs"),
        }
    }
}

/// Load config.json; a missing file yields the defaults
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = tempdir().unwrap();
        let config = load_config(temp_dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "author_name": "Ada", "report_days": 14 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.author_name, "Ada");
        assert_eq!(config.report_days, 14);
        assert_eq!(config.csv_file, "task_log.csv");
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);

        let config = Config {
            exports_dir: "reports".to_string(),
            history_limit: 10,
            ..Config::default()
        };
        save_config(&path, &config).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_paths() {
        let config = Config::default();
        let paths = Paths::new(Path::new("/data"), &config);
        assert_eq!(paths.csv_file, PathBuf::from("/data/task_log.csv"));
        assert_eq!(paths.exports_dir, PathBuf::from("/data/exports"));
        assert_eq!(paths.event_log, PathBuf::from("/data/exports/task_history.log"));
        assert_eq!(paths.logs_dir, PathBuf::from("/data/logs"));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
