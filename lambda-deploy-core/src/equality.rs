//! Local-versus-remote configuration comparison.

use crate::model::{Environment, FunctionConfig, RemoteFunctionInfo, Secrets};

/// Environment equality where a missing environment counts as an empty one.
///
/// Two empty environments are equal, an empty and a non-empty one never are, and two non-empty
/// ones are equal when they hold the same keys with the same values.
pub fn environments_equal(a: Option<&Environment>, b: Option<&Environment>) -> bool {
    fn non_empty(env: Option<&Environment>) -> Option<&Environment> {
        env.filter(|e| !e.is_empty())
    }
    match (non_empty(a), non_empty(b)) {
        (None, None) => true,
        (Some(a), Some(b)) => a.variables == b.variables,
        _ => false,
    }
}

/// Names of every field whose local value differs from the deployed one.
pub fn config_diff(
    config: &FunctionConfig,
    secrets: &Secrets,
    remote: &RemoteFunctionInfo,
) -> Vec<&'static str> {
    let mut mismatched = Vec::new();
    if config.function_name != remote.function_name {
        mismatched.push("FunctionName");
    }
    if config.description != remote.description {
        mismatched.push("Description");
    }
    if config.handler != remote.handler {
        mismatched.push("Handler");
    }
    if remote.runtime.as_deref() != Some(config.runtime.as_str()) {
        mismatched.push("Runtime");
    }
    if remote.memory_size != Some(config.memory_size) {
        mismatched.push("MemorySize");
    }
    if remote.timeout != Some(config.timeout) {
        mismatched.push("Timeout");
    }
    if secrets.role != remote.role {
        mismatched.push("Role");
    }
    if !environments_equal(Some(&secrets.environment), Some(&remote.environment)) {
        mismatched.push("Environment");
    }
    mismatched
}

pub fn config_matches(
    config: &FunctionConfig,
    secrets: &Secrets,
    remote: &RemoteFunctionInfo,
) -> bool {
    config_diff(config, secrets, remote).is_empty()
}
