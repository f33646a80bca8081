//! Deploy decision engine.
//!
//! A deploy moves through START → CHECK_EXISTENCE → {CREATE | VERIFY_CONFIG} → CODE_UPDATE → DONE.
//! [`plan`] covers the decision (pure, given the lookup result) and [`deploy`] runs it against a
//! [`LambdaApi`].
//!
//! A function whose deployed configuration has drifted from the local one is rejected unless the
//! caller asks for the configuration to be overwritten. A code-only deploy never silently
//! replaces configuration drift.

use std::fmt;

use tracing::{error, info, warn};

use crate::code_update::{update_code, CodeUpdateOutcome};
use crate::constants;
use crate::contract::{CreateFunctionRequest, FunctionParameters, LambdaApi, RemoteError};
use crate::equality::config_diff;
use crate::error::{DeployError, Result};
use crate::model::{FunctionConfig, RemoteFunctionInfo, Secrets};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Create the function when it does not exist yet.
    pub create: bool,
    /// Push the local configuration even when it differs from the deployed one.
    pub update_config: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployPlan {
    Create,
    Update {
        remote: RemoteFunctionInfo,
        push_config: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    Created {
        function: RemoteFunctionInfo,
    },
    Updated {
        config_updated: bool,
        code: CodeUpdateOutcome,
    },
}

impl fmt::Display for DeployOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", constants::DEPLOY_COMPLETE)?;
        match self {
            DeployOutcome::Created { .. } => f.write_str(constants::FUNCTION_CREATED),
            DeployOutcome::Updated {
                config_updated: true,
                code,
            } => write!(f, "configuration updated, {code}"),
            DeployOutcome::Updated { code, .. } => write!(f, "{code}"),
        }
    }
}

/// Decides what to do with the result of looking the function up.
pub fn plan(
    lookup: std::result::Result<RemoteFunctionInfo, RemoteError>,
    config: &FunctionConfig,
    secrets: &Secrets,
    options: DeployOptions,
) -> Result<DeployPlan> {
    let remote = match lookup {
        Ok(remote) => remote,
        Err(RemoteError::NotFound) if options.create => {
            info!(function_name = %config.function_name, "[DEPLOY] Function not found, creating it");
            return Ok(DeployPlan::Create);
        }
        Err(RemoteError::NotFound) => {
            error!(function_name = %config.function_name, "[DEPLOY] Function not found and create not requested");
            return Err(DeployError::LambdaNotFound(config.function_name.clone()));
        }
        Err(e) => {
            error!(error = %e, function_name = %config.function_name, "[DEPLOY] Function lookup failed");
            return Err(DeployError::remote("get function", e));
        }
    };

    if options.update_config {
        info!(function_name = %config.function_name, "[DEPLOY] Configuration update requested");
        return Ok(DeployPlan::Update {
            remote,
            push_config: true,
        });
    }

    let mismatched = config_diff(config, secrets, &remote);
    if !mismatched.is_empty() {
        warn!(
            function_name = %config.function_name,
            fields = ?mismatched,
            "[DEPLOY] Deployed configuration differs from local configuration"
        );
        return Err(DeployError::LambdaConfigMismatch {
            function: config.function_name.clone(),
            fields: mismatched,
        });
    }

    info!(function_name = %config.function_name, "[DEPLOY] Deployed configuration matches");
    Ok(DeployPlan::Update {
        remote,
        push_config: false,
    })
}

/// Creates or updates the function described by `config` and `secrets` with the archive `zip`.
pub async fn deploy<A>(
    api: &A,
    config: &FunctionConfig,
    secrets: &Secrets,
    zip: Vec<u8>,
    options: DeployOptions,
) -> Result<DeployOutcome>
where
    A: LambdaApi + ?Sized,
{
    info!(function_name = %config.function_name, ?options, "[DEPLOY] Starting deploy");
    let lookup = api.get_function(config.function_name.clone()).await;
    let params = FunctionParameters::from_local(config, secrets);

    match plan(lookup, config, secrets, options)? {
        DeployPlan::Create => {
            let function = api
                .create_function(CreateFunctionRequest {
                    parameters: params,
                    zip_file: zip,
                    publish: config.publish,
                })
                .await
                .map_err(|e| {
                    error!(error = %e, function_name = %config.function_name, "[DEPLOY] Create failed");
                    DeployError::remote("create function", e)
                })?;
            info!(
                function_name = %function.function_name,
                version = ?function.version,
                "[DEPLOY] Function created"
            );
            Ok(DeployOutcome::Created { function })
        }
        DeployPlan::Update {
            remote,
            push_config,
        } => {
            let config_update = async {
                if !push_config {
                    return Ok(false);
                }
                api.update_function_configuration(params)
                    .await
                    .map(|_| {
                        info!(function_name = %config.function_name, "[DEPLOY] Configuration updated");
                        true
                    })
                    .map_err(|e| {
                        error!(error = %e, function_name = %config.function_name, "[DEPLOY] Configuration update failed");
                        DeployError::remote("update function configuration", e)
                    })
            };
            let code_update = update_code(
                api,
                &config.function_name,
                zip,
                config.publish,
                &remote.code_sha256,
            );

            // Issued together; the first failure is reported.
            let (config_updated, code) = tokio::try_join!(config_update, code_update)?;
            Ok(DeployOutcome::Updated {
                config_updated,
                code,
            })
        }
    }
}
