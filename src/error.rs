//! Error types for loading, validation and form misuse.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Issue;

/// Errors while loading default values or schemas.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch {url}: built without the `remote` feature")]
    RemoteDisabled { url: String },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON object of field values, got {actual}")]
    NotAnObject { actual: String },

    // Schema errors (exit code 2)
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. }
            | LoadError::ReadError { .. }
            | LoadError::RemoteDisabled { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Raw result of a rejected validation run.
///
/// This is data handed to the invalid handler, not a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("validation failed with {} issue(s)", .issues.len())]
pub struct ValidationFailure {
    pub issues: Vec<Issue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// Shorthand for a failure with one issue.
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

/// Misuse of a form handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("form context used outside a mounted form provider")]
    Unmounted,
}

pub type FormResult<T> = Result<T, FormError>;
