//! Configuration management for Parley
//!
//! Values are layered: environment, then the TOML file, then defaults.

pub mod file;

use std::path::PathBuf;

pub use file::{ParleyConfigFile, config_file_path, load_config_file, parse_config};

use crate::llm::{ChatFormat, SamplingParams};
use crate::{Error, Result};

/// Parley configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend to run turns against
    pub backend: BackendConfig,
}

/// Which backend strategy to use, with its settings
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// Stateless chat-completion API
    Chat(ChatBackendConfig),
    /// Remote session that keeps history server-side
    Session(SessionBackendConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatBackendConfig {
    /// Base URL; `/chat/completions` is appended
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub format: ChatFormat,
    pub uppercase_roles: bool,
    pub sampling: SamplingParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBackendConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub agent_endpoint_id: String,
}

/// Audio cache directory from the environment and the config file
///
/// Needs no backend settings, so cache commands work without them.
pub fn cache_dir() -> PathBuf {
    resolve_cache_dir(load_config_file().cache.dir, |name| std::env::var(name).ok())
}

/// `PARLEY_CACHE_DIR`, then the file's `[cache] dir`, then the default
pub fn resolve_cache_dir(
    file_dir: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    env("PARLEY_CACHE_DIR")
        .or(file_dir)
        .map_or_else(default_cache_dir, PathBuf::from)
}

/// Default audio cache directory
///
/// Uses `~/.cache/omni/parley/audio`, falling back to a relative path.
pub fn default_cache_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".parley/audio"),
        |d| d.cache_dir().join("omni").join("parley").join("audio"),
    )
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if required backend settings are missing
    pub fn load() -> Result<Self> {
        let fc = load_config_file();
        Self::from_file_config(fc, |name| std::env::var(name).ok())
    }

    /// Layer `env` over a parsed config file
    ///
    /// `env` looks up a variable by name, so callers can supply something
    /// other than the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown backend kind, or when the
    /// selected backend lacks an endpoint, model or agent endpoint id
    pub fn from_file_config(
        fc: ParleyConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let kind = env("PARLEY_BACKEND")
            .or(fc.backend.kind)
            .unwrap_or_else(|| "chat".to_string());
        let endpoint = env("PARLEY_ENDPOINT").or(fc.backend.endpoint);
        let api_key = env("PARLEY_API_KEY").or(fc.backend.api_key);

        let require = |value: Option<String>, what: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{kind} backend requires {what}")))
        };

        let backend = match kind.to_lowercase().as_str() {
            "chat" => BackendConfig::Chat(ChatBackendConfig {
                endpoint: require(endpoint, "an endpoint")?,
                api_key,
                model: require(env("PARLEY_MODEL").or(fc.chat.model), "a model")?,
                format: fc.chat.format.unwrap_or_default(),
                uppercase_roles: fc.chat.uppercase_roles.unwrap_or(false),
                sampling: fc.chat.sampling,
            }),
            "session" => BackendConfig::Session(SessionBackendConfig {
                endpoint: require(endpoint, "an endpoint")?,
                api_key,
                agent_endpoint_id: require(
                    env("PARLEY_AGENT_ENDPOINT_ID").or(fc.session.agent_endpoint_id),
                    "an agent endpoint id",
                )?,
            }),
            other => {
                return Err(Error::Config(format!(
                    "unknown backend kind {other:?} (expected \"chat\" or \"session\")"
                )));
            }
        };

        Ok(Self { backend })
    }
}
