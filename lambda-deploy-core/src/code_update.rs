//! Two-phase code update: a dry run computes the hash the update would produce, and the real
//! update is only issued when that hash differs from the deployed code.
//!
//! Skipping unchanged code matters when `Publish` is set, where every real update would cut a
//! new version.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::constants;
use crate::contract::{LambdaApi, UpdateCodeRequest};
use crate::error::{DeployError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum CodeUpdateOutcome {
    UpToDate {
        code_sha256: String,
    },
    Updated {
        code_sha256: String,
        version: Option<String>,
    },
}

impl fmt::Display for CodeUpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeUpdateOutcome::UpToDate { .. } => f.write_str(constants::CODE_UP_TO_DATE),
            CodeUpdateOutcome::Updated {
                version: Some(version),
                ..
            } => write!(f, "{} (version {version})", constants::CODE_UPDATED),
            CodeUpdateOutcome::Updated { .. } => f.write_str(constants::CODE_UPDATED),
        }
    }
}

/// SHA-256 of an archive, base64 encoded the way the remote API reports `CodeSha256`.
pub fn archive_sha256(zip: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(zip);
    STANDARD.encode(hasher.finalize())
}

/// Updates the code of `function_name` unless the deployed code already matches `zip`.
///
/// `current_sha256` is the `CodeSha256` of the deployed function.
pub async fn update_code<A>(
    api: &A,
    function_name: &str,
    zip: Vec<u8>,
    publish: bool,
    current_sha256: &str,
) -> Result<CodeUpdateOutcome>
where
    A: LambdaApi + ?Sized,
{
    debug!(
        function_name,
        local_sha256 = %archive_sha256(&zip),
        remote_sha256 = current_sha256,
        "[DEPLOY][CODE] Comparing archive against deployed code"
    );

    let dry_run = api
        .update_function_code(UpdateCodeRequest {
            function_name: function_name.to_string(),
            zip_file: zip.clone(),
            publish,
            dry_run: true,
        })
        .await
        .map_err(|e| {
            error!(error = %e, function_name, "[DEPLOY][CODE] Dry-run code update failed");
            DeployError::remote("update function code (dry run)", e)
        })?;

    if dry_run.code_sha256 == current_sha256 {
        info!(
            function_name,
            code_sha256 = %dry_run.code_sha256,
            "[DEPLOY][CODE] Code already up to date"
        );
        return Ok(CodeUpdateOutcome::UpToDate {
            code_sha256: dry_run.code_sha256,
        });
    }

    info!(
        function_name,
        from = current_sha256,
        to = %dry_run.code_sha256,
        publish,
        "[DEPLOY][CODE] Updating function code"
    );
    let updated = api
        .update_function_code(UpdateCodeRequest {
            function_name: function_name.to_string(),
            zip_file: zip,
            publish,
            dry_run: false,
        })
        .await
        .map_err(|e| {
            error!(error = %e, function_name, "[DEPLOY][CODE] Code update failed");
            DeployError::remote("update function code", e)
        })?;

    info!(
        function_name,
        code_sha256 = %updated.code_sha256,
        version = ?updated.version,
        "[DEPLOY][CODE] Code update applied"
    );
    Ok(CodeUpdateOutcome::Updated {
        code_sha256: updated.code_sha256,
        version: updated.version,
    })
}
