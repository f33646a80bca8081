//! Loads the configuration, secrets and test documents, and creates defaults during `init`.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{DeployError, Result};
use crate::model::{Document, DocumentKind, FunctionConfig, Secrets, TestCase, TestSuite};
use crate::store;

/// What `init` found and what it wrote.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InitReport {
    pub created: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
}

impl InitReport {
    fn record(&mut self, path: PathBuf, created: bool) {
        if created {
            self.created.push(path);
        } else {
            self.existing.push(path);
        }
    }
}

pub fn document_path(dir: &Path, kind: DocumentKind) -> PathBuf {
    dir.join(kind.file_name())
}

/// Returns the document at `path`, or writes and returns the default document when it is
/// missing or unreadable. The flag is true when the default was written.
pub async fn load_or_init<T: Document>(path: &Path) -> Result<(T, bool)> {
    match store::read_typed::<T>(path).await {
        Ok(doc) => {
            info!(path = %path.display(), kind = %T::KIND, "[INIT] Document already present");
            Ok((doc, false))
        }
        Err(e) => {
            warn!(path = %path.display(), kind = %T::KIND, reason = %e, "[INIT] Writing default document");
            let doc = T::default_document();
            store::write_typed(path, &doc).await?;
            Ok((doc, true))
        }
    }
}

/// Ensures all three documents exist in `dir`.
pub async fn init(dir: &Path) -> Result<InitReport> {
    let config_path = document_path(dir, DocumentKind::Config);
    let secrets_path = document_path(dir, DocumentKind::Secrets);
    let tests_path = document_path(dir, DocumentKind::Tests);

    let ((_, config_created), (_, secrets_created), (_, tests_created)) = tokio::try_join!(
        load_or_init::<FunctionConfig>(&config_path),
        load_or_init::<Secrets>(&secrets_path),
        load_or_init::<TestSuite>(&tests_path),
    )?;

    let mut report = InitReport::default();
    report.record(config_path, config_created);
    report.record(secrets_path, secrets_created);
    report.record(tests_path, tests_created);
    info!(
        created = report.created.len(),
        existing = report.existing.len(),
        "[INIT] Documents ready"
    );
    Ok(report)
}

/// Loads the function configuration and secrets from `dir`, both required to be complete.
pub async fn load_config(dir: &Path) -> Result<(FunctionConfig, Secrets)> {
    let (config, secrets) = tokio::try_join!(load_function_config(dir), load_secrets(dir))?;
    info!(
        function_name = %config.function_name,
        runtime = %config.runtime,
        region = %secrets.region,
        "Loaded function configuration and secrets"
    );
    Ok((config, secrets))
}

pub async fn load_function_config(dir: &Path) -> Result<FunctionConfig> {
    let path = document_path(dir, DocumentKind::Config);
    let config: FunctionConfig = store::read_typed(&path).await?;
    config.require_fields().inspect_err(|e| {
        error!(error = %e, path = %path.display(), "Function configuration incomplete");
    })?;
    Ok(config)
}

pub async fn load_secrets(dir: &Path) -> Result<Secrets> {
    let path = document_path(dir, DocumentKind::Secrets);
    let secrets: Secrets = store::read_typed(&path).await?;
    secrets.require_fields().inspect_err(|e| {
        error!(error = %e, path = %path.display(), "Secrets incomplete");
    })?;
    Ok(secrets)
}

pub async fn load_tests(path: &Path) -> Result<Vec<TestCase>> {
    let TestSuite(cases) = store::read_typed(path).await?;
    info!(path = %path.display(), cases = cases.len(), "Loaded test cases");
    Ok(cases)
}

/// Reads the deployment archive named by `archiveName`, relative to `dir` unless absolute.
pub async fn load_archive(dir: &Path, config: &FunctionConfig) -> Result<Vec<u8>> {
    let path = dir.join(&config.archive_name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            info!(path = %path.display(), bytes = bytes.len(), "Loaded deployment archive");
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(path = %path.display(), "Deployment archive not found");
            Err(DeployError::FileNotFound(path))
        }
        Err(e) => {
            error!(error = ?e, path = %path.display(), "Failed to read deployment archive");
            Err(DeployError::Io { path, source: e })
        }
    }
}
