//! Configuration for the task-list server.
//!
//! Settings come from, in increasing precedence: built-in defaults, a YAML
//! file (`tasklist-web.yaml` in the working directory, or an explicit path),
//! `TASKLIST_*` environment variables, and command-line flags.

use crate::error::{Error, Result};
use crate::tasks::StoreKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "tasklist-web.yaml";

/// Database file name inside the data directory.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// Directory name under the platform's local data directory.
const DATA_DIR_NAME: &str = "tasklist-web";

/// Environment variable names.
pub mod env_vars {
    /// Interface to bind.
    pub const HOST: &str = "TASKLIST_HOST";
    /// TCP port.
    pub const PORT: &str = "TASKLIST_PORT";
    /// `sqlite` or `memory`.
    pub const STORE: &str = "TASKLIST_STORE";
    /// `SQLite` database path.
    pub const DATABASE: &str = "TASKLIST_DATABASE";
    /// Directory of template overrides.
    pub const TEMPLATES: &str = "TASKLIST_TEMPLATES";
    /// Log file path.
    pub const LOG_FILE: &str = "TASKLIST_LOG_FILE";
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Which store implementation to use.
    pub store: StoreKind,

    /// Path of the `SQLite` database (ignored by the memory store).
    pub database_path: PathBuf,

    /// Directory whose `*.html` files override the embedded templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store: StoreKind::default(),
            database_path: default_database_path(),
            templates_dir: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from `explicit` if given, else from [`CONFIG_FILE_NAME`]
    /// in `base_dir` if present, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or a file exists but
    /// cannot be parsed.
    pub fn load(explicit: Option<&Path>, base_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let default_path = base_dir.join(CONFIG_FILE_NAME);
        if default_path.exists() {
            Self::load_from(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(host) = var(env_vars::HOST) {
            self.host = host;
        }
        if let Some(port) = var(env_vars::PORT) {
            self.port = port.trim().parse().map_err(|e| {
                Error::Config(format!("{}='{port}' is not a valid port: {e}", env_vars::PORT))
            })?;
        }
        if let Some(store) = var(env_vars::STORE) {
            self.store = store.parse()?;
        }
        if let Some(path) = var(env_vars::DATABASE) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = var(env_vars::TEMPLATES) {
            self.templates_dir = Some(PathBuf::from(path));
        }
        if let Some(path) = var(env_vars::LOG_FILE) {
            self.log_file = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// The `host:port` string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default database location: `<local data dir>/tasklist-web/tasks.sqlite3`.
///
/// Falls back to the working directory if the platform has no data directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join(DATA_DIR_NAME))
        .join(DATABASE_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.store, StoreKind::Sqlite);
        assert!(config.database_path.ends_with(DATABASE_FILENAME));
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "port: 8080\nstore: memory\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_load_finds_default_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "host: 127.0.0.1\n").unwrap();

        let config = AppConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(AppConfig::load(None, dir.path()).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = AppConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "store: mongo\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .apply_env_from(lookup(&[
                (env_vars::HOST, "127.0.0.1"),
                (env_vars::PORT, "8081"),
                (env_vars::STORE, "memory"),
                (env_vars::DATABASE, "/tmp/x.db"),
                (env_vars::TEMPLATES, "/srv/templates"),
                (env_vars::LOG_FILE, "logFile.log"),
            ]))
            .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.templates_dir, Some(PathBuf::from("/srv/templates")));
        assert_eq!(config.log_file, Some(PathBuf::from("logFile.log")));
    }

    #[test]
    fn test_env_empty_values_ignored() {
        let config =
            AppConfig::default().apply_env_from(lookup(&[(env_vars::PORT, "  ")])).unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_env_invalid_port() {
        let err =
            AppConfig::default().apply_env_from(lookup(&[(env_vars::PORT, "http")])).unwrap_err();
        assert!(err.to_string().contains(env_vars::PORT));
    }

    #[test]
    fn test_env_invalid_store() {
        let result = AppConfig::default().apply_env_from(lookup(&[(env_vars::STORE, "redis")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial_test::serial]
    fn test_apply_env_reads_process_environment() {
        std::env::set_var(env_vars::PORT, "9090");
        let config = AppConfig::default().apply_env();
        std::env::remove_var(env_vars::PORT);

        assert_eq!(config.unwrap().port, 9090);
    }
}
