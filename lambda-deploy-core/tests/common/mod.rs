#![allow(dead_code)]

use lambda_deploy_core::model::{Environment, FunctionConfig, RemoteFunctionInfo, Runtime, Secrets};

pub const ROLE: &str = "arn:aws:iam::123456789012:role/orders-intake";
pub const CURRENT_SHA: &str = "Zm9vYmFyLWN1cnJlbnQtY29kZQ==";

pub fn local_config() -> FunctionConfig {
    FunctionConfig {
        archive_name: "lambda.zip".to_string(),
        function_name: "orders-intake".to_string(),
        description: "Accepts orders from the storefront".to_string(),
        handler: "bootstrap.handler".to_string(),
        publish: false,
        runtime: Runtime::ProvidedAl2023,
        memory_size: 256,
        timeout: 10,
    }
}

pub fn local_secrets() -> Secrets {
    Secrets {
        region: "eu-west-1".to_string(),
        profile: String::new(),
        access_key_id: String::new(),
        secret_access_key: String::new(),
        role: ROLE.to_string(),
        environment: [("STAGE", "prod"), ("TABLE", "orders")].into_iter().collect(),
    }
}

/// A deployed function whose configuration matches `local_config` and `local_secrets`.
pub fn matching_remote() -> RemoteFunctionInfo {
    RemoteFunctionInfo {
        function_name: "orders-intake".to_string(),
        description: "Accepts orders from the storefront".to_string(),
        handler: "bootstrap.handler".to_string(),
        runtime: Some("provided.al2023".to_string()),
        memory_size: Some(256),
        timeout: Some(10),
        role: ROLE.to_string(),
        environment: [("TABLE", "orders"), ("STAGE", "prod")].into_iter().collect::<Environment>(),
        code_sha256: CURRENT_SHA.to_string(),
        version: Some("$LATEST".to_string()),
    }
}
