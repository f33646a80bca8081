//! JSON document store on the local filesystem.
//!
//! Every call is a single attempt. Reads distinguish a missing file from unreadable, unparseable
//! and wrongly shaped contents; writes always produce 2-space indented JSON followed by the
//! platform line ending.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error};

use crate::constants::LINE_ENDING;
use crate::error::{DeployError, Result};
use crate::model::{Document, DocumentKind};

/// Reads and parses `path`, optionally checking the result against the shape of `check`.
pub async fn read_document(path: &Path, check: Option<DocumentKind>) -> Result<Value> {
    debug!(path = %path.display(), kind = ?check, "Reading document");
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Document not found");
            return Err(DeployError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            error!(error = ?e, path = %path.display(), "Failed to read document");
            return Err(DeployError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        error!(error = %e, path = %path.display(), "Document is not valid JSON");
        DeployError::InvalidJson {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    if let Some(kind) = check {
        kind.validate(&value).inspect_err(|e| {
            error!(error = %e, path = %path.display(), "Document failed validation");
        })?;
    }
    Ok(value)
}

/// Reads `path` as a validated document of type `T`.
pub async fn read_typed<T: Document>(path: &Path) -> Result<T> {
    let value = read_document(path, None).await?;
    T::from_value(value).inspect_err(|e| {
        error!(error = %e, path = %path.display(), "Document failed validation");
    })
}

/// Serializes `doc` the way every document on disk is laid out.
pub fn render_document(doc: &Value) -> String {
    // serde_json's pretty printer indents with two spaces
    let mut rendered = serde_json::to_string_pretty(doc).unwrap_or_else(|_| doc.to_string());
    rendered.push_str(LINE_ENDING);
    rendered
}

pub async fn write_document(path: &Path, doc: &Value) -> Result<()> {
    debug!(path = %path.display(), "Writing document");
    tokio::fs::write(path, render_document(doc))
        .await
        .map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to write document");
            DeployError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
}

pub async fn write_typed<T: Document>(path: &Path, doc: &T) -> Result<()> {
    let value = doc.to_value().map_err(|e| DeployError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_document(path, &value).await
}
