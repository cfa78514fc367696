//! TOML configuration file loading
//!
//! Supports `~/.config/omni/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;
use crate::llm::{ChatFormat, SamplingParams};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// Which backend to talk to and where
    #[serde(default)]
    pub backend: BackendFileConfig,

    /// Chat-completion backend settings
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Session backend settings
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Audio cache settings
    #[serde(default)]
    pub cache: CacheFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// "chat" or "session"
    pub kind: Option<String>,

    /// Base URL of the backend API
    pub endpoint: Option<String>,

    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    /// Model id or name
    pub model: Option<String>,

    /// "messages" or "flattened"
    pub format: Option<ChatFormat>,

    pub uppercase_roles: Option<bool>,

    /// Sampling parameters, inline in the `[chat]` table
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub agent_endpoint_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheFileConfig {
    /// Audio cache directory
    pub dir: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for the schema
pub fn parse_config(content: &str) -> Result<ParleyConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ParleyConfigFile {
    let Some(path) = config_file_path() else {
        return ParleyConfigFile::default();
    };

    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ParleyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ParleyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/parley/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("parley")
            .join("config.toml")
    })
}
