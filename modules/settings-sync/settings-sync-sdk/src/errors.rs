//! Error types for the settings-sync SDK.

use thiserror::Error;

/// Coarse classification of a remote failure.
///
/// The retry policy and the store decide on retries and session handling by
/// kind, never by message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    Authorization,
    Server,
    NotFound,
}

/// Errors returned by a `SettingsServiceApi` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The service rejected the payload.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Transport-level failure (connection refused, reset, timeout, offline).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The session is not allowed to perform the operation.
    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    /// The service failed while handling a well-formed request.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Settings not found")]
    NotFound,
}

impl SettingsError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Server { .. } => ErrorKind::Server,
            Self::NotFound => ErrorKind::NotFound,
        }
    }
}
