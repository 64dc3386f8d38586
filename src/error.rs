//! Error types for cache-dance
//!
//! All modules use `DanceResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache-dance operations
pub type DanceResult<T> = Result<T, DanceError>;

/// All errors that can occur while extracting caches
#[derive(Error, Debug)]
pub enum DanceError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid cache map: {0}")]
    CacheMapInvalid(String),

    #[error("Invalid cache source {name:?}: {reason}")]
    CacheSourceInvalid { name: String, reason: String },

    #[error("Duplicate cache source: {0}")]
    DuplicateCacheSource(String),

    #[error("Cache source not configured: {0}")]
    CacheSourceNotFound(String),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, output: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Piped command failed: {0}")]
    PipeFailed(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DanceError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create an invalid cache source error
    pub fn invalid_source(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheSourceInvalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { .. } => {
                Some("Make sure docker (with buildx) and tar are installed and on PATH")
            }
            Self::CacheMapInvalid(_) => Some(
                r#"Expected JSON like {"cache-npm": "/root/.npm", "cache-go": {"target": "/go/pkg/mod", "id": "go"}}"#,
            ),
            Self::CacheSourceNotFound(_) => Some("Run: cache-dance config show"),
            _ => None,
        }
    }
}
