//! Document model: the three local JSON documents and the remote function snapshot.
//!
//! Documents are built through [`Document::from_value`], which checks the top-level shape and
//! then deserializes into the typed struct. A document that parses as JSON but does not have the
//! right shape fails with [`DeployError::Validation`] naming the document kind.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants;
use crate::error::{DeployError, Result};

/// The three kinds of local document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Config,
    Secrets,
    Tests,
}

impl DocumentKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Config => constants::CONFIG_FILE,
            DocumentKind::Secrets => constants::SECRETS_FILE,
            DocumentKind::Tests => constants::TESTS_FILE,
        }
    }

    /// Checks the parsed document against the shape this kind requires.
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            DocumentKind::Config => FunctionConfig::from_value(value.clone()).map(|_| ()),
            DocumentKind::Secrets => Secrets::from_value(value.clone()).map(|_| ()),
            DocumentKind::Tests => TestSuite::from_value(value.clone()).map(|_| ()),
        }
    }

    fn expects_array(&self) -> bool {
        matches!(self, DocumentKind::Tests)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Config => "config",
            DocumentKind::Secrets => "secrets",
            DocumentKind::Tests => "tests",
        };
        f.write_str(name)
    }
}

/// A typed local document with a default form written by `init`.
pub trait Document: Serialize + DeserializeOwned + Sized {
    const KIND: DocumentKind;

    fn default_document() -> Self;

    /// Rewrites a deserialization message before it is reported or logged.
    fn redact_message(message: String) -> String {
        message
    }

    /// Validated construction from a parsed JSON value.
    fn from_value(value: Value) -> Result<Self> {
        let shape_ok = if Self::KIND.expects_array() {
            value.is_array()
        } else {
            value.is_object()
        };
        if !shape_ok {
            let expected = if Self::KIND.expects_array() {
                "an array of test cases"
            } else {
                "a JSON object"
            };
            return Err(DeployError::Validation {
                kind: Self::KIND,
                message: format!("expected {expected}"),
            });
        }
        serde_json::from_value(value).map_err(|e| DeployError::Validation {
            kind: Self::KIND,
            message: Self::redact_message(e.to_string()),
        })
    }

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| DeployError::Validation {
            kind: Self::KIND,
            message: e.to_string(),
        })
    }
}

/// The two runtimes functions may be deployed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Runtime {
    #[default]
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
    #[serde(rename = "provided.al2")]
    ProvidedAl2,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::ProvidedAl2023 => "provided.al2023",
            Runtime::ProvidedAl2 => "provided.al2",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `lambda-config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfig {
    #[serde(rename = "archiveName")]
    pub archive_name: String,
    pub function_name: String,
    #[serde(default)]
    pub description: String,
    /// `module.exportName`
    pub handler: String,
    pub publish: bool,
    pub runtime: Runtime,
    pub memory_size: i32,
    pub timeout: i32,
}

impl FunctionConfig {
    /// Fields that must be filled in before a deploy or test run.
    pub fn require_fields(&self) -> Result<()> {
        require(DocumentKind::Config, "FunctionName", &self.function_name)?;
        require(DocumentKind::Config, "Handler", &self.handler)
    }
}

impl Document for FunctionConfig {
    const KIND: DocumentKind = DocumentKind::Config;

    fn default_document() -> Self {
        FunctionConfig {
            archive_name: constants::DEFAULT_ARCHIVE_NAME.to_string(),
            function_name: String::new(),
            description: String::new(),
            handler: constants::DEFAULT_HANDLER.to_string(),
            publish: false,
            runtime: Runtime::default(),
            memory_size: constants::DEFAULT_MEMORY_SIZE,
            timeout: constants::DEFAULT_TIMEOUT,
        }
    }
}

/// Function environment. `Variables` may be absent, which is the same as empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(rename = "Variables", default)]
    pub variables: BTreeMap<String, String>,
}

impl Environment {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values may hold credentials
        f.debug_struct("Environment")
            .field("variables", &self.variables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Environment {
            variables: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Contents of `lambda-secrets.json`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Secrets {
    pub region: String,
    #[serde(default)]
    pub profile: String,
    #[serde(rename = "accessKeyId", default)]
    pub access_key_id: String,
    #[serde(rename = "secretAccessKey", default)]
    pub secret_access_key: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Environment", default)]
    pub environment: Environment,
}

impl Secrets {
    pub fn require_fields(&self) -> Result<()> {
        require(DocumentKind::Secrets, "region", &self.region)?;
        require(DocumentKind::Secrets, "Role", &self.role)
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("access_key_id", &redacted(&self.access_key_id))
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("role", &self.role)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Document for Secrets {
    const KIND: DocumentKind = DocumentKind::Secrets;

    fn redact_message(message: String) -> String {
        redact_unexpected_value(&message)
    }

    fn default_document() -> Self {
        Secrets {
            region: String::new(),
            profile: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            role: String::new(),
            environment: Environment::default(),
        }
    }
}

/// One recorded context and the events to replay against the handler with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub context: Value,
    pub events: Vec<Value>,
}

impl TestCase {
    pub fn label(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("test case #{index}"),
        }
    }
}

/// Contents of `lambda-tests.json`: an ordered list of test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestSuite(pub Vec<TestCase>);

impl Document for TestSuite {
    const KIND: DocumentKind = DocumentKind::Tests;

    fn default_document() -> Self {
        TestSuite(vec![TestCase {
            name: None,
            context: Value::Object(Default::default()),
            events: Vec::new(),
        }])
    }
}

/// Snapshot of a deployed function's configuration, fetched fresh for every deploy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteFunctionInfo {
    pub function_name: String,
    pub description: String,
    pub handler: String,
    pub runtime: Option<String>,
    pub memory_size: Option<i32>,
    pub timeout: Option<i32>,
    pub role: String,
    pub environment: Environment,
    pub code_sha256: String,
    pub version: Option<String>,
}

fn require(kind: DocumentKind, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeployError::MissingField { kind, field });
    }
    Ok(())
}

/// Drops the offending value from serde's "invalid type/value: <value>, expected .." messages,
/// keeping only what kind of value it was.
fn redact_unexpected_value(message: &str) -> String {
    for prefix in ["invalid type: ", "invalid value: "] {
        if let Some(rest) = message.strip_prefix(prefix) {
            if let Some(end) = rest.find(", expected") {
                let found = rest[..end].split_whitespace().next().unwrap_or("value");
                return format!("{prefix}{found}{}", &rest[end..]);
            }
        }
    }
    message.to_string()
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}
