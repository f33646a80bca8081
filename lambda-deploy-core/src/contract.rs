//! # contract: interface to the remote function management API
//!
//! This module defines the [`LambdaApi`] trait and the plain request/response types that cross
//! it. The real implementation lives in the CLI crate (backed by the AWS SDK); tests use the
//! `mockall`-generated [`MockLambdaApi`].
//!
//! The trait does no validation of its own beyond building the request. Not-found is the only
//! failure callers branch on, so [`RemoteError`] separates it from everything else.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::model::{Environment, FunctionConfig, RemoteFunctionInfo, Secrets};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("function not found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

/// Configuration parameters shared by create and update-configuration calls.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameters {
    pub function_name: String,
    pub description: String,
    pub handler: String,
    pub runtime: String,
    pub memory_size: i32,
    pub timeout: i32,
    pub role: String,
    pub environment: Environment,
}

impl FunctionParameters {
    /// Merges the local configuration with the role and environment held in the secrets.
    pub fn from_local(config: &FunctionConfig, secrets: &Secrets) -> Self {
        FunctionParameters {
            function_name: config.function_name.clone(),
            description: config.description.clone(),
            handler: config.handler.clone(),
            runtime: config.runtime.as_str().to_string(),
            memory_size: config.memory_size,
            timeout: config.timeout,
            role: secrets.role.clone(),
            environment: secrets.environment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunctionRequest {
    pub parameters: FunctionParameters,
    pub zip_file: Vec<u8>,
    pub publish: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCodeRequest {
    pub function_name: String,
    pub zip_file: Vec<u8>,
    pub publish: bool,
    /// Compute the resulting code hash without applying the update.
    pub dry_run: bool,
}

/// Result of an `update_function_code` call (dry run or real).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionUpdateResult {
    pub code_sha256: String,
    pub version: Option<String>,
}

/// Remote function management operations.
///
/// The trait is `Send + Sync` so one client can be shared by the concurrent calls of a deploy.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LambdaApi: Send + Sync {
    /// Fetch the current configuration of a deployed function.
    async fn get_function(&self, function_name: String)
        -> Result<RemoteFunctionInfo, RemoteError>;

    /// Create the function, uploading its code in the same call.
    async fn create_function(
        &self,
        req: CreateFunctionRequest,
    ) -> Result<RemoteFunctionInfo, RemoteError>;

    async fn update_function_code(
        &self,
        req: UpdateCodeRequest,
    ) -> Result<FunctionUpdateResult, RemoteError>;

    async fn update_function_configuration(
        &self,
        params: FunctionParameters,
    ) -> Result<RemoteFunctionInfo, RemoteError>;
}
