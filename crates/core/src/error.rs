//! Error types for the activity bridge
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the activity bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown permission kind: {0}")]
    UnknownPermission(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for activity bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BridgeError::Host(_) | BridgeError::InvalidState(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::Io(e) => format!("File operation failed: {}", e),
            BridgeError::Config(msg) => format!("Configuration error: {}", msg),
            BridgeError::UnknownPermission(name) => {
                format!("'{}' is not a supported permission kind", name)
            }
            BridgeError::Host(msg) => format!("The host permission service failed: {}", msg),
            _ => self.to_string(),
        }
    }
}
