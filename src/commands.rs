//! Public entry points behind the CLI: `init`, `deploy` and `test`.
//!
//! Each has a `*_with` form taking the remote client or handler loader explicitly, used by the
//! integration tests. The plain forms build the real AWS client and the process handler loader.

use std::path::Path;

use lambda_deploy_core::contract::LambdaApi;
use lambda_deploy_core::deploy::{self, DeployOptions, DeployOutcome};
use lambda_deploy_core::invoke::{HandlerLoader, HandlerRef, ProcessLoader};
use lambda_deploy_core::loader::{self, document_path, InitReport};
use lambda_deploy_core::model::{DocumentKind, Secrets};
use lambda_deploy_core::store;
use lambda_deploy_core::test_runner::{self, TestReport};
use lambda_deploy_core::Result;
use tracing::{debug, info};

use crate::lambda_client::AwsLambdaClient;

/// Ensures the config, secrets and tests documents exist in `dir`.
pub async fn init(dir: &Path) -> Result<InitReport> {
    info!(dir = %dir.display(), "[INIT] Initialising documents");
    loader::init(dir).await
}

pub async fn deploy(dir: &Path, options: DeployOptions) -> Result<DeployOutcome> {
    let (config, secrets) = loader::load_config(dir).await?;
    let zip = loader::load_archive(dir, &config).await?;
    let client = AwsLambdaClient::from_secrets(&secrets).await;
    deploy::deploy(&client, &config, &secrets, zip, options).await
}

pub async fn deploy_with<A>(api: &A, dir: &Path, options: DeployOptions) -> Result<DeployOutcome>
where
    A: LambdaApi + ?Sized,
{
    let (config, secrets) = loader::load_config(dir).await?;
    let zip = loader::load_archive(dir, &config).await?;
    deploy::deploy(api, &config, &secrets, zip, options).await
}

/// Runs the test documents against the configured handler as a process in `dir`.
///
/// `tests_file` defaults to `lambda-tests.json` in `dir`. When the secrets document is present its
/// environment variables are passed to the handler.
pub async fn test(dir: &Path, tests_file: Option<&Path>) -> Result<TestReport> {
    let secrets_path = document_path(dir, DocumentKind::Secrets);
    let env = match store::read_typed::<Secrets>(&secrets_path).await {
        Ok(secrets) => secrets.environment.variables,
        Err(e) => {
            debug!(reason = %e, "[TEST] Running without secrets environment");
            Default::default()
        }
    };
    let handlers = ProcessLoader::new().with_env(env);
    test_with(&handlers, dir, tests_file).await
}

pub async fn test_with<L>(handlers: &L, dir: &Path, tests_file: Option<&Path>) -> Result<TestReport>
where
    L: HandlerLoader + ?Sized,
{
    let config = loader::load_function_config(dir).await?;
    HandlerRef::parse(&config.handler)?;

    let tests_path = match tests_file {
        Some(path) => dir.join(path),
        None => document_path(dir, DocumentKind::Tests),
    };
    let cases = loader::load_tests(&tests_path).await?;
    test_runner::run_tests(handlers, dir, &config.handler, &cases).await
}
