use crate::app_dirs::AppDirs;
use crate::language::SupportedLanguage;
use crate::result::ContentType;
use crate::session::{SessionConfig, DEFAULT_IDLE_TIMEOUT_MS};
use crate::state::{ErrorMode, NewlineMode};
use crate::word_generator::WordGenConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub number_of_words: usize,
    pub language: SupportedLanguage,
    pub error_mode: ErrorMode,
    pub newline_mode: NewlineMode,
    pub adaptive: bool,
    pub weak_key_intensity: f64,
    pub idle_timeout_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_of_words: 15,
            language: SupportedLanguage::English,
            error_mode: ErrorMode::default(),
            newline_mode: NewlineMode::default(),
            adaptive: true,
            weak_key_intensity: 0.7,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl Config {
    pub fn session_config(&self, content_type: ContentType) -> SessionConfig {
        SessionConfig {
            error_mode: self.error_mode,
            newline_mode: self.newline_mode,
            content_type,
            idle_timeout_ms: self.idle_timeout_ms,
        }
    }

    pub fn word_gen_config(&self, custom_prompt: Option<String>) -> WordGenConfig {
        WordGenConfig {
            number_of_words: self.number_of_words.max(1),
            custom_prompt,
            adaptive: self.adaptive,
            weak_key_intensity: self.weak_key_intensity,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_dir()
            .map(|dir| dir.join("config.json"))
            .unwrap_or_else(|| PathBuf::from("typewise_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files yield the defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring invalid config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            number_of_words: 50,
            language: SupportedLanguage::English,
            error_mode: ErrorMode::StopOnError,
            newline_mode: NewlineMode::Optional,
            adaptive: false,
            weak_key_intensity: 0.25,
            idle_timeout_ms: 5_000,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"errorMode\": \"stop-on-error\""));
    }

    #[test]
    fn missing_or_invalid_file_yields_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"numberOfWords": 30}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.number_of_words, 30);
        assert_eq!(cfg.error_mode, ErrorMode::CorrectionRequired);
    }

    #[test]
    fn derived_configs() {
        let cfg = Config {
            error_mode: ErrorMode::AdvanceOnError,
            idle_timeout_ms: 2_000,
            ..Config::default()
        };
        let session = cfg.session_config(ContentType::Custom);
        assert_eq!(session.error_mode, ErrorMode::AdvanceOnError);
        assert_eq!(session.idle_timeout_ms, 2_000);
        assert_eq!(session.content_type, ContentType::Custom);

        let words = cfg.word_gen_config(Some("hi".into()));
        assert_eq!(words.custom_prompt.as_deref(), Some("hi"));
        assert_eq!(words.number_of_words, 15);
    }
}
