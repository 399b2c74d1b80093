//! Error types for xcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, XcastError>;

#[derive(Error, Debug)]
pub enum XcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl XcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            XcastError::InvalidInput(_) => 3,
            XcastError::Platform(PlatformError::Authentication(_)) => 2,
            XcastError::Platform(_) => 1,
            XcastError::Config(_) => 1,
        }
    }

    /// Message shown to agents in the `{"error": ...}` envelope.
    ///
    /// Usage errors are reported verbatim (e.g. `Tweet ID required`) so that
    /// callers can match on them; everything else keeps its category prefix.
    pub fn agent_message(&self) -> String {
        match self {
            XcastError::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Response(String),
}

/// Failures of the local state files.
///
/// These never leave the store layer: every public store operation
/// collapses them to an empty store or a skipped write.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Failed to replace state file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
