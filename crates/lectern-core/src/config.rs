//! Settings passed explicitly to every component.
//!
//! Loaded from `config.toml` in the app data directory (or an explicit file),
//! with environment overrides applied on top. The API key is never written to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{DEFAULT_MAX_CHARS, DEFAULT_OVERLAP};

const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable overriding `index.dir`.
pub const INDEX_DIR_ENV: &str = "LECTERN_INDEX_DIR";

pub const DEFAULT_INDEX_DIR: &str = "faiss_index";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_EMBED_MODEL: &str = "models/embedding-001";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
/// Passages handed to the model per question.
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub chunking: ChunkingConfig,
    pub gemini: GeminiConfig,
    pub retrieval: RetrievalConfig,
    pub logging: LoggingConfig,
    /// Credential for the embedding and generation service. Only ever set from
    /// the environment or the command line.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the persisted index. Replaced wholesale on every build.
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_INDEX_DIR),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub embed_model: String,
    pub chat_model: String,
    pub temperature: f32,
    /// Per-request timeout. Unset means calls may block indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Log filter settings. `RUST_LOG` wins over these when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug or trace.
    pub default: String,
    /// Per-target overrides, e.g. `lectern_core = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Read an explicit config file. Unlike [`load_config`], errors are reported.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&s).map_err(ConfigError::Parse)
    }

    /// Apply `GOOGLE_API_KEY` and `LECTERN_INDEX_DIR` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Like [`Config::with_env`] but with a caller-provided lookup, so tests never
    /// touch the real environment.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(dir) = lookup(INDEX_DIR_ENV).filter(|d| !d.is_empty()) {
            self.index.dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index.dir = dir.into();
        self
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    let path = data_dir.join(CONFIG_FILENAME);
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
            Config::default()
        }
    }
}

/// Save config to the app data directory. Returns the path written.
pub fn save_config(config: &Config) -> Result<PathBuf, ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    let path = data_dir.join(CONFIG_FILENAME);
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(&path, s).map_err(ConfigError::Write)?;
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("invalid config: {0}")]
    Parse(toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_behaviour() {
        let c = Config::default();
        assert_eq!(c.index.dir, PathBuf::from("faiss_index"));
        assert_eq!(c.chunking.max_chars, 10_000);
        assert_eq!(c.chunking.overlap, 1_000);
        assert_eq!(c.gemini.embed_model, "models/embedding-001");
        assert_eq!(c.gemini.chat_model, "gemini-1.5-flash");
        assert!((c.gemini.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(c.retrieval.top_k, 4);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c: Config = toml::from_str(
            r#"
            [chunking]
            max_chars = 500

            [gemini]
            request_timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(c.chunking.max_chars, 500);
        assert_eq!(c.chunking.overlap, 1_000);
        assert_eq!(c.gemini.request_timeout_secs, Some(30));
        assert_eq!(c.index.dir, PathBuf::from("faiss_index"));
    }

    #[test]
    fn api_key_is_never_serialized() {
        let c = Config::default().with_api_key("secret");
        let s = toml::to_string_pretty(&c).unwrap();
        assert!(!s.contains("secret"));
    }

    #[test]
    fn env_overrides_apply() {
        let c = Config::default().with_env_from(|key| match key {
            API_KEY_ENV => Some("k-123".to_string()),
            INDEX_DIR_ENV => Some("/tmp/idx".to_string()),
            _ => None,
        });
        assert_eq!(c.api_key.as_deref(), Some("k-123"));
        assert_eq!(c.index.dir, PathBuf::from("/tmp/idx"));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let c = Config::default().with_env_from(|key| (key == API_KEY_ENV).then(|| "  ".to_string()));
        assert!(c.api_key.is_none());
    }

    #[test]
    fn from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking\nmax_chars = ").unwrap();
        assert!(matches!(Config::from_path(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::from_path(&dir.path().join("missing.toml")),
            Err(ConfigError::Read(..))
        ));
    }
}
