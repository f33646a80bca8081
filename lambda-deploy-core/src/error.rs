//! Error taxonomy shared by every operation in the crate.
//!
//! Errors are surfaced to the caller as-is: nothing is retried, and a batch of concurrent
//! operations reports only the first failure it sees. Whether an error ends the process is up to
//! the CLI.

use std::path::PathBuf;

use crate::model::DocumentKind;

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} document: {message}")]
    Validation { kind: DocumentKind, message: String },

    #[error("invalid {kind} document: \"{field}\" must not be empty")]
    MissingField {
        kind: DocumentKind,
        field: &'static str,
    },

    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    #[error("lambda function \"{0}\" not found; deploy with create enabled to create it")]
    LambdaNotFound(String),

    #[error(
        "lambda function \"{function}\" configuration differs from local configuration ({}); deploy with update-config enabled to overwrite it",
        .fields.join(", ")
    )]
    LambdaConfigMismatch {
        function: String,
        fields: Vec<&'static str>,
    },

    #[error("{operation} failed: {message}")]
    RemoteCall {
        operation: &'static str,
        message: String,
    },

    #[error("invalid handler: {0}")]
    InvalidHandler(String),

    #[error("{0}")]
    Invocation(String),
}

impl DeployError {
    pub fn remote(operation: &'static str, err: impl std::fmt::Display) -> Self {
        DeployError::RemoteCall {
            operation,
            message: err.to_string(),
        }
    }
}
