//! Configuration management for xcast
//!
//! Settings come from `~/.config/xcast/config.toml` (or `XCAST_CONFIG`),
//! every field has a default, and a missing file is the same as an empty
//! one. Secrets and deployment-specific endpoints may instead live in a
//! `.env` file next to it, the way the agent tooling around this CLI is
//! usually provisioned.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::{dedup, reply_log};

pub const DEDUP_FILE_NAME: &str = "action_dedup.json";
pub const REPLY_LOG_FILE_NAME: &str = "reply_log.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `.env` file loaded before environment overrides are applied
    pub env_file: Option<String>,
    pub state: StateConfig,
    pub dedup: DedupConfig,
    pub reply_log: ReplyLogConfig,
    pub twitter: TwitterConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the dedup store and reply log
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: dedup::DEFAULT_TTL_SECS,
            capacity: dedup::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyLogConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
    pub max_text_chars: usize,
}

impl Default for ReplyLogConfig {
    fn default() -> Self {
        Self {
            ttl_secs: reply_log::DEFAULT_TTL_SECS,
            capacity: reply_log::DEFAULT_CAPACITY,
            max_text_chars: reply_log::DEFAULT_MAX_TEXT_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    /// Program (plus leading arguments) that performs network calls
    pub bridge_command: Vec<String>,
    pub bridge_timeout_secs: u64,
    /// Saved session cookies (JSON object with `auth_token` and `ct0`)
    pub cookies_file: Option<String>,
    pub language: String,
    pub proxy: Option<String>,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            bridge_command: vec!["xcast-bridge".to_string()],
            bridge_timeout_secs: 60,
            cookies_file: None,
            language: "en-US".to_string(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Base URL of the platform API; reporting is off unless both this and
    /// `api_key` are set
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 5,
        }
    }
}

impl ReportConfig {
    pub fn is_enabled(&self) -> bool {
        matches!((&self.url, &self.api_key), (Some(url), Some(key)) if !url.is_empty() && !key.is_empty())
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `None`, then apply `.env` and environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => resolve_config_path()?,
        };
        let mut config = Self::load_from_path(&config_path)?;
        config.load_env_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path. A missing file yields the
    /// defaults; an unparseable one is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::ReadError(e).into()),
        };
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Export the variables of the configured `.env` file into the process
    /// environment. Variables already set in the environment win.
    pub fn load_env_file(&self) -> Result<()> {
        let path = match &self.env_file {
            Some(path) => expand_path(path),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("xcast").join(".env"),
                None => return Ok(()),
            },
        };
        if !path.exists() {
            return Ok(());
        }
        if let Err(e) = dotenv::from_path(&path) {
            tracing::warn!("Failed to load {}: {}", path.display(), e);
        }
        Ok(())
    }

    /// `TWITTER_PROXY`, `PLATFORM_API_URL`, and `PLATFORM_API_KEY` take
    /// precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(proxy) = non_empty_env("TWITTER_PROXY") {
            self.twitter.proxy = Some(proxy);
        }
        if let Some(url) = non_empty_env("PLATFORM_API_URL") {
            self.report.url = Some(url);
        }
        if let Some(key) = non_empty_env("PLATFORM_API_KEY") {
            self.report.api_key = Some(key);
        }
    }

    /// Directory holding the state files.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state.dir {
            return Ok(expand_path(dir));
        }
        resolve_data_path()
    }

    pub fn dedup_path(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join(DEDUP_FILE_NAME))
    }

    pub fn reply_log_path(&self) -> Result<PathBuf> {
        Ok(self.state_dir()?.join(REPLY_LOG_FILE_NAME))
    }

    /// Where session cookies are saved between runs.
    pub fn cookies_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.twitter.cookies_file {
            return Ok(expand_path(path));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;
        Ok(config_dir.join("xcast").join("twitter_cookies.json"))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("XCAST_CONFIG") {
        return Ok(expand_path(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("xcast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("xcast"))
}
