#![doc = "AWS implementation of the remote function API used by deploy."]
//
//! # Lambda client (CLI <-> AWS)
//!
//! This module wires the [`LambdaApi`] trait from `lambda-deploy-core` to the AWS Lambda
//! management API through `aws-sdk-lambda`.
//!
//! - Construct [`AwsLambdaClient`] from the loaded [`Secrets`]; the region always comes from
//!   `Secrets.region`.
//! - Credentials are resolved by [`CredentialSource::resolve`]: a named profile when one is set,
//!   else the explicit key pair when both halves are set, else the SDK's default chain.
//! - A missing function is reported as [`RemoteError::NotFound`]; every other SDK failure becomes
//!   [`RemoteError::Other`] with the full error context.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment as LambdaEnvironment, FunctionCode, Runtime};
use aws_sdk_lambda::Client;

use lambda_deploy_core::constants::CREDENTIALS_PROVIDER_NAME;
use lambda_deploy_core::contract::{
    CreateFunctionRequest, FunctionParameters, FunctionUpdateResult, LambdaApi, RemoteError,
    UpdateCodeRequest,
};
use lambda_deploy_core::model::{Environment, RemoteFunctionInfo, Secrets};

/// Where the client's credentials come from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Profile(String),
    StaticKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    Default,
}

impl CredentialSource {
    pub fn resolve(secrets: &Secrets) -> Self {
        if !secrets.profile.is_empty() {
            return CredentialSource::Profile(secrets.profile.clone());
        }
        if !secrets.access_key_id.is_empty() && !secrets.secret_access_key.is_empty() {
            return CredentialSource::StaticKeys {
                access_key_id: secrets.access_key_id.clone(),
                secret_access_key: secrets.secret_access_key.clone(),
            };
        }
        CredentialSource::Default
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Profile(profile) => write!(f, "Profile({profile})"),
            CredentialSource::StaticKeys { .. } => f.write_str("StaticKeys(<redacted>)"),
            CredentialSource::Default => f.write_str("Default"),
        }
    }
}

pub struct AwsLambdaClient {
    client: Client,
}

impl AwsLambdaClient {
    pub async fn from_secrets(secrets: &Secrets) -> Self {
        let source = CredentialSource::resolve(secrets);
        tracing::info!(region = %secrets.region, credentials = ?source, "Initialising Lambda client");

        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(secrets.region.clone()));
        let loader = match source {
            CredentialSource::Profile(profile) => loader.profile_name(profile),
            CredentialSource::StaticKeys {
                access_key_id,
                secret_access_key,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            )),
            CredentialSource::Default => loader,
        };
        let sdk_config = loader.load().await;
        AwsLambdaClient {
            client: Client::new(&sdk_config),
        }
    }
}

// The get/create/update-configuration outputs share their accessors but not a type.
macro_rules! remote_info {
    ($cfg:expr) => {{
        let cfg = $cfg;
        RemoteFunctionInfo {
            function_name: cfg.function_name().unwrap_or_default().to_string(),
            description: cfg.description().unwrap_or_default().to_string(),
            handler: cfg.handler().unwrap_or_default().to_string(),
            runtime: cfg.runtime().map(|r| r.as_str().to_string()),
            memory_size: cfg.memory_size(),
            timeout: cfg.timeout(),
            role: cfg.role().unwrap_or_default().to_string(),
            environment: cfg
                .environment()
                .and_then(|env| env.variables())
                .map(|vars| {
                    vars.iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect::<Environment>()
                })
                .unwrap_or_default(),
            code_sha256: cfg.code_sha256().unwrap_or_default().to_string(),
            version: cfg.version().map(str::to_string),
        }
    }};
}

fn lambda_environment(env: &Environment) -> LambdaEnvironment {
    let variables: HashMap<String, String> = env
        .variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    LambdaEnvironment::builder()
        .set_variables(Some(variables))
        .build()
}

fn other<E>(err: E) -> RemoteError
where
    E: std::error::Error + 'static,
{
    RemoteError::Other(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl LambdaApi for AwsLambdaClient {
    async fn get_function(
        &self,
        function_name: String,
    ) -> Result<RemoteFunctionInfo, RemoteError> {
        tracing::info!(function_name = %function_name, "Fetching function configuration");
        let output = self
            .client
            .get_function()
            .function_name(&function_name)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception());
                if not_found {
                    tracing::info!(function_name = %function_name, "Function does not exist");
                    RemoteError::NotFound
                } else {
                    tracing::error!(error = %DisplayErrorContext(&e), "GetFunction failed");
                    other(e)
                }
            })?;

        let configuration = output.configuration().ok_or_else(|| {
            RemoteError::Other(format!(
                "GetFunction returned no configuration for {function_name}"
            ))
        })?;
        Ok(remote_info!(configuration))
    }

    async fn create_function(
        &self,
        req: CreateFunctionRequest,
    ) -> Result<RemoteFunctionInfo, RemoteError> {
        let params = req.parameters;
        tracing::info!(
            function_name = %params.function_name,
            runtime = %params.runtime,
            archive_bytes = req.zip_file.len(),
            publish = req.publish,
            "Creating function"
        );
        let output = self
            .client
            .create_function()
            .function_name(params.function_name)
            .description(params.description)
            .handler(params.handler)
            .runtime(Runtime::from(params.runtime.as_str()))
            .memory_size(params.memory_size)
            .timeout(params.timeout)
            .role(params.role)
            .environment(lambda_environment(&params.environment))
            .publish(req.publish)
            .code(FunctionCode::builder().zip_file(Blob::new(req.zip_file)).build())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %DisplayErrorContext(&e), "CreateFunction failed");
                other(e)
            })?;
        Ok(remote_info!(&output))
    }

    async fn update_function_code(
        &self,
        req: UpdateCodeRequest,
    ) -> Result<FunctionUpdateResult, RemoteError> {
        tracing::info!(
            function_name = %req.function_name,
            archive_bytes = req.zip_file.len(),
            publish = req.publish,
            dry_run = req.dry_run,
            "Updating function code"
        );
        let output = self
            .client
            .update_function_code()
            .function_name(req.function_name)
            .zip_file(Blob::new(req.zip_file))
            .publish(req.publish)
            .dry_run(req.dry_run)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %DisplayErrorContext(&e), "UpdateFunctionCode failed");
                other(e)
            })?;
        Ok(FunctionUpdateResult {
            code_sha256: output.code_sha256().unwrap_or_default().to_string(),
            version: output.version().map(str::to_string),
        })
    }

    async fn update_function_configuration(
        &self,
        params: FunctionParameters,
    ) -> Result<RemoteFunctionInfo, RemoteError> {
        tracing::info!(function_name = %params.function_name, "Updating function configuration");
        let output = self
            .client
            .update_function_configuration()
            .function_name(params.function_name)
            .description(params.description)
            .handler(params.handler)
            .runtime(Runtime::from(params.runtime.as_str()))
            .memory_size(params.memory_size)
            .timeout(params.timeout)
            .role(params.role)
            .environment(lambda_environment(&params.environment))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %DisplayErrorContext(&e), "UpdateFunctionConfiguration failed");
                other(e)
            })?;
        Ok(remote_info!(&output))
    }
}
