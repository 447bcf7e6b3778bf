//! Error types for search, resolution and document updates.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while linking a note to a concept.
///
/// All payloads are owned strings so the error is `Clone`; a debounced search
/// hands the same failure to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkerError {
    /// Endpoint unreachable or transport failure.
    #[error("HTTP request failed: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Unexpected response or document shape.
    #[error("Failed to parse {0}")]
    Parse(String),

    /// Document storage rejected creation.
    #[error("Failed to create document {path}: {reason}")]
    DocumentCreate {
        /// Target path
        path: PathBuf,
        /// Cause reported by the store
        reason: String,
    },

    /// Reading or writing an existing document failed.
    #[error("Failed to update document {path}: {reason}")]
    Document {
        /// Target path
        path: PathBuf,
        /// Cause reported by the store
        reason: String,
    },

    /// A document was created but the merge into it failed.
    #[error("Empty placeholder left at {path}: {source}")]
    PlaceholderLeft {
        /// Placeholder document path
        path: PathBuf,
        /// Failure that interrupted the merge
        #[source]
        source: Box<LinkerError>,
    },

    /// Path escapes the vault or is otherwise unusable.
    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    /// The picker chose an index outside the offered suggestions.
    #[error("No suggestion at index {index} ({available} offered)")]
    NoSuchSuggestion {
        /// Chosen index
        index: usize,
        /// Number of suggestions offered
        available: usize,
    },

    /// A debounced call was dropped before it completed.
    #[error("Search was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for LinkerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LinkerError::Parse(format!("response body: {}", err))
        } else {
            LinkerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LinkerError {
    fn from(err: serde_json::Error) -> Self {
        LinkerError::Parse(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for LinkerError {
    fn from(err: serde_yaml::Error) -> Self {
        LinkerError::Parse(format!("front matter: {}", err))
    }
}

/// Result type for linking operations.
pub type Result<T> = std::result::Result<T, LinkerError>;
