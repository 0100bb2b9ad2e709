//! Error types and handling for the urban heat analyzer

use thiserror::Error;

/// Main error type for the urban heat analyzer
#[derive(Error, Debug)]
pub enum UrbanHeatError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Query log storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl UrbanHeatError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Whether the caller is at fault (bad request) rather than the server
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, UrbanHeatError::Validation { .. })
    }

    /// Message safe to hand to API clients; internals stay in the logs
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            UrbanHeatError::Config { .. } => {
                "Configuration error. Please check your config file and service URLs.".to_string()
            }
            UrbanHeatError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            UrbanHeatError::Storage { .. } => {
                "Query log operation failed. Check the storage path and permissions.".to_string()
            }
            UrbanHeatError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            UrbanHeatError::General { message } => message.clone(),
        }
    }
}

impl From<fjall::Error> for UrbanHeatError {
    fn from(err: fjall::Error) -> Self {
        UrbanHeatError::storage(err.to_string())
    }
}

impl From<postcard::Error> for UrbanHeatError {
    fn from(err: postcard::Error) -> Self {
        UrbanHeatError::storage(format!("record encoding failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for UrbanHeatError {
    fn from(err: tokio::task::JoinError) -> Self {
        UrbanHeatError::general(format!("background task failed: {err}"))
    }
}
