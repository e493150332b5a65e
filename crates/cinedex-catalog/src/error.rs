//! Error taxonomy for catalog requests and local storage.
//!
//! # Design
//! - Transport and decode failures are classified once, in the HTTP helper;
//!   the service layer passes them through untouched.
//! - Only the controller turns a [`FetchError`] into a user-facing message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for catalog requests.
pub type FetchResult<T> = Result<T, FetchError>;

/// Classified failure of a catalog request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider answered 404.
    #[error("resource not found")]
    NotFound,
    /// The provider answered with another non-success status.
    #[error("request failed with status {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Provider `status_message` or a generic fallback.
        message: String,
    },
    /// Every attempt exceeded the deadline.
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout {
        /// Number of attempts made.
        attempts: u32,
    },
    /// The request never reached the provider.
    #[error("network failure: {detail}")]
    Network {
        /// Transport error detail.
        detail: String,
    },
    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
    /// Anything not covered above.
    #[error("unexpected failure during {operation}: {detail}")]
    Unknown {
        /// Step that failed.
        operation: &'static str,
        /// Original cause rendered as text.
        detail: String,
    },
}

impl FetchError {
    pub(crate) fn unknown(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Unknown {
            operation,
            detail: cause.to_string(),
        }
    }

    /// Whether this failure came from cancellation rather than a real error.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for showing to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound => "The requested title could not be found.".to_string(),
            Self::Http { message, .. } => message.clone(),
            Self::Timeout { .. } => "The request timed out. Please try again.".to_string(),
            Self::Network { .. } => {
                "Connection error. Check your internet connection.".to_string()
            }
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::Unknown { .. } => "Unknown error while processing the request.".to_string(),
        }
    }
}

/// Failure of the local key/value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage io failure during {operation}")]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The backing document or a stored value was not valid JSON.
    #[error("storage json failure during {operation}")]
    Json {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
