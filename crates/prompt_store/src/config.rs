//! Library configuration
//!
//! Values come from `config.toml` in the data directory, then from
//! `PROMPT_LIBRARY_*` environment variables.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_DATA_DIR: &str = "PROMPT_LIBRARY_DIR";
pub const ENV_API_BASE: &str = "PROMPT_LIBRARY_API_BASE";
pub const ENV_API_KEY: &str = "PROMPT_LIBRARY_API_KEY";
pub const ENV_MODEL: &str = "PROMPT_LIBRARY_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Directory holding one JSON file per user
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".prompt-library")
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
        }
    }
}

impl LibraryConfig {
    /// Resolve configuration from `config.toml` in the data directory and the environment
    pub fn load() -> Self {
        let data_dir = std::env::var_os(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        Self::load_from(&data_dir, |key| std::env::var(key).ok())
    }

    /// Resolve configuration for an explicit data directory
    ///
    /// `lookup` stands in for the process environment.
    pub fn load_from(data_dir: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let path = data_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str::<LibraryConfig>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(e) => warn!("Ignoring malformed {:?}: {}", path, e),
                },
                Err(e) => warn!("Failed to read {:?}: {}", path, e),
            }
        }
        config.data_dir = data_dir.to_path_buf();

        if let Some(api_base) = lookup(ENV_API_BASE) {
            config.api_base = api_base;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            config.api_key = Some(api_key);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config.model = model;
        }

        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        config
    }

    /// Suggestions are only available with an API key
    pub fn has_suggestions(&self) -> bool {
        self.api_key.is_some()
    }
}
