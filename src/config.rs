//! Filter configuration.
//!
//! Filters read their options from a flat property bag keyed by dotted names
//! (`indexer.setting.debug.option`, `ner.backend`, ...). Files in TOML, YAML
//! or JSON are flattened into that shape when loaded, so
//!
//! ```toml
//! [indexer.setting.debug]
//! option = true
//! ```
//!
//! and `{"indexer.setting.debug.option": "true"}` are equivalent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Name used for config file discovery (`indexfilters.toml`, `indexfilters.json`, ...).
pub const CONFIG_NAME: &str = "indexfilters";

/// Configuration keys recognised by the filters in this crate.
pub mod keys {
    /// Comma-separated plugin names, in the order the chain runs them.
    pub const FILTER_ORDER: &str = "indexingfilter.order";

    pub const CONTENT_LENGTH_TAGS: &str = "contentlength.tags";
    pub const CONTENT_NER_TAGS: &str = "contentner.tags";
    pub const YOUTUBE_CC_READER_TAGS: &str = "youtubeccreader.tags";

    pub const OUTPUT_DIR: &str = "indexer.setting.youtubeccreader.output.dir.option";
    pub const URL_REGEX: &str = "indexer.setting.youtubeccreader.regex.input.file";
    pub const DEBUG: &str = "indexer.setting.debug.option";
    pub const INCLUDE_TITLE: &str = "indexer.setting.include.title.option";
    pub const INCLUDE_TRACK_TITLE: &str = "indexer.setting.include.track.title.option";
    pub const REMOVE_TIMING_SUBTITLE: &str = "indexer.setting.remove.timing.subtitle.option";
    pub const YTDLP_PATH: &str = "indexer.setting.youtubeccreader.ytdlp.path";
    pub const YTDLP_PROXY: &str = "indexer.setting.youtubeccreader.proxy";

    pub const NER_BACKEND: &str = "ner.backend";
    pub const NER_CORENLP_URL: &str = "ner.corenlp.url";
    pub const NER_CORENLP_TIMEOUT_SECS: &str = "ner.corenlp.timeout.secs";
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Config root must be a table, got {0}")]
    NotATable(&'static str),
}

/// Flat key/value configuration shared by all indexing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration using prefer for file discovery.
    /// Falls back to an empty configuration when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                debug!("No {} config file found, using defaults", CONFIG_NAME);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        Self::parse(&contents, ext)
    }

    /// Parse configuration text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        let value: Value = match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        Self::from_value(&value)
    }

    /// Flatten a structured value into dotted keys.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            Value::Array(_) => return Err(ConfigError::NotATable("array")),
            _ => return Err(ConfigError::NotATable("scalar")),
        };

        let mut properties = BTreeMap::new();
        for (key, child) in map {
            flatten_into(&mut properties, key, child);
        }
        Ok(Self { properties })
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Overlay every property of `other` on top of this configuration.
    pub fn merge(&mut self, other: &Configuration) {
        for (key, value) in &other.properties {
            self.properties.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Read a boolean. Unparsable values fall back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(str::trim) {
            None => default,
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) if v.eq_ignore_ascii_case("false") => false,
            Some(v) => {
                warn!(
                    "Invalid boolean '{}' for {}, using default {}",
                    v, key, default
                );
                default
            }
        }
    }

    /// Read an unsigned integer. Unparsable values fall back to `default`.
    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            None => default,
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid integer '{}' for {}, using default {}", v, key, default);
                default
            }),
        }
    }

    /// Read a comma-separated list, trimming entries and dropping empty ones.
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(out, &format!("{}.{}", prefix, key), child);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        Value::Null => {}
        scalar => {
            out.insert(prefix.to_string(), scalar_to_string(scalar));
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
