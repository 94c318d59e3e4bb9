//! Persisted config (documents root, Ollama models, retrieval settings) in the app data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{ChunkerConfig, DEFAULT_MIN_CHARS};
use crate::error::RagError;
use crate::generate::{GenerationOptions, DEFAULT_TEMPERATURE};
use crate::ollama::{OllamaClient, OllamaError, DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL, DEFAULT_GENERATE_MODEL};
use crate::retriever::RetrieveOptions;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the user's documents directory (chosen by them).
    pub docs_root: Option<String>,
    pub ollama_url: String,
    pub embed_model: String,
    pub generate_model: String,
    pub temperature: f32,
    /// Sections shorter than this many characters are not indexed.
    pub min_chunk_chars: usize,
    pub top_k: usize,
    /// Drop retrieved chunks scoring below this; unset keeps all top-k.
    pub min_score: Option<f64>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_root: None,
            ollama_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            min_chunk_chars: DEFAULT_MIN_CHARS,
            top_k: 3,
            min_score: None,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.top_k == 0 {
            return Err(RagError::invalid("top_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(RagError::invalid(format!(
                "temperature {} is outside [0, 1]",
                self.temperature
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(RagError::invalid("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            min_chars: self.min_chunk_chars,
        }
    }

    pub fn retrieve_options(&self) -> RetrieveOptions {
        RetrieveOptions {
            k: self.top_k,
            min_score: self.min_score,
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
        }
    }

    pub fn ollama_client(&self) -> Result<OllamaClient, OllamaError> {
        Ok(OllamaClient::from_url(&self.ollama_url)?
            .with_embed_model(&self.embed_model)
            .with_generate_model(&self.generate_model)
            .with_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    load_config_from(&data_dir.join(CONFIG_FILENAME))
}

fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config");
            Config::default()
        }
    }
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    let path = data_dir.join(CONFIG_FILENAME);
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(&path, s).map_err(ConfigError::Write)
}

/// Get the configured documents root path, if any.
pub fn get_docs_root() -> Option<PathBuf> {
    load_config()
        .docs_root
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Set and persist the documents root.
pub fn set_docs_root(path: &Path) -> Result<(), ConfigError> {
    let path = path.canonicalize().map_err(ConfigError::Canonicalize)?;
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path));
    }
    let mut config = load_config();
    config.docs_root = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "top_k = 5\nmin_score = 0.25\n").unwrap();
        let c = load_config_from(&path);
        assert_eq!(c.top_k, 5);
        assert_eq!(c.min_score, Some(0.25));
        assert_eq!(c.generate_model, DEFAULT_GENERATE_MODEL);
        assert_eq!(c.min_chunk_chars, 100);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "top_k = \"many\"").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let c = Config {
            docs_root: Some("/tmp/docs".into()),
            ..Config::default()
        };
        let s = toml::to_string_pretty(&c).unwrap();
        assert_eq!(toml::from_str::<Config>(&s).unwrap(), c);
    }

    #[test]
    fn validation() {
        assert!(Config::default().validate().is_ok());
        let bad = [
            Config { top_k: 0, ..Config::default() },
            Config { temperature: 1.2, ..Config::default() },
            Config { request_timeout_secs: 0, ..Config::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(RagError::InvalidArgument(_))));
        }
    }

    #[test]
    fn builds_client_from_settings() {
        let c = Config {
            embed_model: "nomic-embed-text".into(),
            ..Config::default()
        };
        let client = c.ollama_client().unwrap();
        assert_eq!(client.embed_model(), "nomic-embed-text");
        assert_eq!(client.generate_model(), DEFAULT_GENERATE_MODEL);
    }
}
