//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default breathing pattern and session length
//! - History backend and retention
//! - Mood check-in retention
//! - Log level
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::backend::KvBackend;
use super::data_dir;
use super::database::Database;
use super::json_file::JsonFileBackend;
use crate::error::{ConfigError, StorageError};
use crate::timer::BreathingPattern;

/// Defaults applied when the shell does not pick a pattern or length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_pattern")]
    pub default_pattern: String,
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
    #[serde(default = "default_true")]
    pub auto_finish: bool,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_backend")]
    pub backend: HistoryBackend,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    #[serde(default = "default_max_mood_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionDefaults,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub mood: MoodConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_pattern() -> String {
    "4-7-8".into()
}
fn default_duration_secs() -> u64 {
    180
}
fn default_true() -> bool {
    true
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_backend() -> HistoryBackend {
    HistoryBackend::Sqlite
}
fn default_max_records() -> usize {
    super::history::DEFAULT_MAX_RECORDS
}
fn default_max_mood_entries() -> usize {
    crate::mood::DEFAULT_MAX_ENTRIES
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            default_pattern: default_pattern(),
            default_duration_secs: default_duration_secs(),
            auto_finish: true,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_records: default_max_records(),
        }
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_mood_entries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::Load {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails [`Config::validate`], or if the default config cannot be
    /// written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// [`Config::load`] against an explicit file.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory. The result must pass [`Config::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if BreathingPattern::find(&self.session.default_pattern).is_none() {
            return invalid("session.default_pattern", "unknown breathing pattern");
        }
        if self.session.default_duration_secs == 0 {
            return invalid("session.default_duration_secs", "must be greater than zero");
        }
        if self.session.tick_interval_ms == 0 {
            return invalid("session.tick_interval_ms", "must be greater than zero");
        }
        if self.history.max_records == 0 {
            return invalid("history.max_records", "must be greater than zero");
        }
        if self.mood.max_entries == 0 {
            return invalid("mood.max_entries", "must be greater than zero");
        }
        Ok(())
    }

    /// Open the configured history backend inside `data_dir()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub fn open_backend(&self) -> Result<Box<dyn KvBackend>, StorageError> {
        Ok(match self.history.backend {
            HistoryBackend::Sqlite => Box::new(Database::open()?),
            HistoryBackend::Json => Box::new(JsonFileBackend::new(data_dir()?.join("history"))?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.default_pattern, "4-7-8");
        assert_eq!(parsed.session.default_duration_secs, 180);
        assert_eq!(parsed.history.backend, HistoryBackend::Sqlite);
        assert_eq!(parsed.history.max_records, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[history]\nbackend = \"json\"\n").unwrap();
        assert_eq!(parsed.history.backend, HistoryBackend::Json);
        assert_eq!(parsed.history.max_records, 10);
        assert!(parsed.session.auto_finish);
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.auto_finish").as_deref(), Some("true"));
        assert_eq!(cfg.get("session.default_duration_secs").as_deref(), Some("180"));
        assert_eq!(cfg.get("history.backend").as_deref(), Some("sqlite"));
        assert!(cfg.get("session.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("session.auto_finish", "false").unwrap();
        cfg.apply("session.default_duration_secs", "300").unwrap();
        cfg.apply("session.default_pattern", "box").unwrap();
        cfg.apply("history.backend", "json").unwrap();
        assert!(!cfg.session.auto_finish);
        assert_eq!(cfg.session.default_duration_secs, 300);
        assert_eq!(cfg.session.default_pattern, "box");
        assert_eq!(cfg.history.backend, HistoryBackend::Json);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("session.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.auto_finish", "not_a_bool").is_err());
        assert!(cfg.apply("history.max_records", "-3").is_err());
        assert!(cfg.apply("history.backend", "postgres").is_err());
    }

    #[test]
    fn apply_rejects_values_that_fail_validation() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.default_pattern", "2-2-2").is_err());
        assert!(cfg.apply("session.default_duration_secs", "0").is_err());
        assert!(cfg.apply("history.max_records", "0").is_err());
        assert_eq!(cfg.session.default_pattern, "4-7-8");
    }

    #[test]
    fn load_rejects_hand_edited_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ntick_interval_ms = 0\n").unwrap();

        match Config::load_from(&path) {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "session.tick_interval_ms")
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }

        std::fs::write(&path, "[session]\ndefault_pattern = \"2-2-2\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn load_writes_defaults_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.mood.max_entries, 30);
        assert!(path.exists());
        assert!(Config::load_from(&path).is_ok());
    }

    #[test]
    fn mood_retention_is_configurable() {
        let mut cfg = Config::default();
        cfg.apply("mood.max_entries", "5").unwrap();
        assert_eq!(cfg.mood.max_entries, 5);
        assert!(cfg.apply("mood.max_entries", "0").is_err());
    }
}
