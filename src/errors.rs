//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the retrieval engine, providing structured
//! error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Client, Controller, Configuration, Generic
//!
//! ## Key Features
//! - One crate-wide error enum with a `Result` alias
//! - Automatic conversion from transport and serialization errors
//! - Recoverability classification for retry decisions
//! - Structured logging integration

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Error types for the query and retrieval engine
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Network-related errors during search pagination
    #[error("network error: {details}")]
    Network { details: String },

    /// Unexpected HTTP status from the remote index
    #[error("unexpected HTTP status {status} during {operation}")]
    RemoteStatus { operation: String, status: u16 },

    /// Data parsing errors
    #[error("failed to parse data from {origin}: {details}")]
    DataParsing { origin: String, details: String },

    /// A single-document fetch failed. Always recoverable: the affected
    /// decision records the cause and keeps its identifier for a retry.
    #[error("{cause}")]
    Fetch { cause: String },

    /// A retrieval session is already running
    #[error("a retrieval session is already active")]
    SessionActive,

    /// Configuration errors
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Internal system errors
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RetrievalError {
    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RetrievalError::Network { .. }
                | RetrievalError::RemoteStatus { .. }
                | RetrievalError::Fetch { .. }
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            RetrievalError::Network { .. }
            | RetrievalError::RemoteStatus { .. }
            | RetrievalError::DataParsing { .. }
            | RetrievalError::Fetch { .. } => "client",
            RetrievalError::SessionActive => "controller",
            RetrievalError::Config { .. } | RetrievalError::Toml(_) => "configuration",
            RetrievalError::Io(_)
            | RetrievalError::Json(_)
            | RetrievalError::Internal { .. } => "generic",
        }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Network {
            details: err.to_string(),
        }
    }
}
