//! # invoke: resolving and calling function handlers locally
//!
//! A handler is named `module.exportName`. [`HandlerLoader`] turns that name into something
//! callable, failing with [`DeployError::InvalidHandler`] when the module or the export cannot be
//! resolved. Two loaders are provided:
//!
//! - [`HandlerRegistry`]: handlers registered in-process under a module and export name.
//! - [`ProcessLoader`]: the module is an executable in the working directory. Each invocation
//!   runs it with the export name as its only argument, writes `{"event": .., "context": ..}` to
//!   its stdin and reads `{"error": .., "result": ..}` back from its stdout. A module without the
//!   export exits with status [`UNKNOWN_EXPORT_EXIT_CODE`].
//!
//! Either way a call resolves to the handler's `(error, result)` pair, as a `Result`.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

use crate::constants::UNKNOWN_EXPORT_EXIT_CODE;
use crate::error::{DeployError, Result};

/// A handler name split into its module and export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    pub module: String,
    pub export: String,
}

impl HandlerRef {
    /// Parses `module.exportName`. Anything other than exactly two non-empty tokens is rejected.
    pub fn parse(handler: &str) -> Result<Self> {
        let parts: Vec<&str> = handler.split('.').collect();
        match parts.as_slice() {
            [module, export] if !module.is_empty() && !export.is_empty() => Ok(HandlerRef {
                module: module.to_string(),
                export: export.to_string(),
            }),
            _ => Err(DeployError::InvalidHandler(format!(
                "\"{handler}\" is not of the form module.exportName"
            ))),
        }
    }
}

impl std::fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.export)
    }
}

/// Why an invocation produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// The handler's own error, passed through verbatim.
    #[error("{0}")]
    Failed(String),
    /// The module turned out not to export the requested handler.
    #[error("{0}")]
    UnknownExport(String),
}

impl From<String> for InvokeError {
    fn from(message: String) -> Self {
        InvokeError::Failed(message)
    }
}

impl From<InvokeError> for DeployError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Failed(message) => DeployError::Invocation(message),
            InvokeError::UnknownExport(message) => DeployError::InvalidHandler(message),
        }
    }
}

/// A resolved handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, event: Value, context: Value) -> std::result::Result<Value, InvokeError>;
}

/// Resolves handler names to callables.
pub trait HandlerLoader: Send + Sync {
    fn load(&self, dir: &Path, handler: &HandlerRef) -> Result<Arc<dyn Handler>>;
}

type BoxedHandlerFuture = Pin<Box<dyn Future<Output = std::result::Result<Value, String>> + Send>>;

struct FnHandler {
    f: Box<dyn Fn(Value, Value) -> BoxedHandlerFuture + Send + Sync>,
}

#[async_trait]
impl Handler for FnHandler {
    async fn invoke(&self, event: Value, context: Value) -> std::result::Result<Value, InvokeError> {
        (self.f)(event, context).await.map_err(InvokeError::Failed)
    }
}

/// Wraps an async closure `(event, context) -> Result<Value, String>` as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Value, String>> + Send + 'static,
{
    Arc::new(FnHandler {
        f: Box::new(move |event, context| Box::pin(f(event, context))),
    })
}

/// Handlers registered in-process, keyed by module and then export name.
#[derive(Default)]
pub struct HandlerRegistry {
    modules: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        module: impl Into<String>,
        export: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> &mut Self {
        self.modules
            .entry(module.into())
            .or_default()
            .insert(export.into(), handler);
        self
    }
}

impl HandlerLoader for HandlerRegistry {
    fn load(&self, _dir: &Path, handler: &HandlerRef) -> Result<Arc<dyn Handler>> {
        let module = self.modules.get(&handler.module).ok_or_else(|| {
            DeployError::InvalidHandler(format!("module \"{}\" is not registered", handler.module))
        })?;
        module.get(&handler.export).cloned().ok_or_else(|| {
            DeployError::InvalidHandler(format!(
                "module \"{}\" has no export \"{}\"",
                handler.module, handler.export
            ))
        })
    }
}

/// Runs handlers as executables found in the working directory.
#[derive(Debug, Default, Clone)]
pub struct ProcessLoader {
    env: BTreeMap<String, String>,
}

impl ProcessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables set in the environment of every handler process.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

impl HandlerLoader for ProcessLoader {
    fn load(&self, dir: &Path, handler: &HandlerRef) -> Result<Arc<dyn Handler>> {
        let program = dir.join(&handler.module);
        if !program.is_file() {
            return Err(DeployError::InvalidHandler(format!(
                "module \"{}\" not found at {}",
                handler.module,
                program.display()
            )));
        }
        if !handler
            .export
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DeployError::InvalidHandler(format!(
                "\"{}\" is not a valid export name",
                handler.export
            )));
        }
        if !is_executable(&program) {
            return Err(DeployError::InvalidHandler(format!(
                "module \"{}\" at {} is not executable",
                handler.module,
                program.display()
            )));
        }
        debug!(program = %program.display(), export = %handler.export, "Resolved process handler");
        Ok(Arc::new(ProcessHandler {
            program,
            export: handler.export.clone(),
            working_dir: dir.to_path_buf(),
            env: self.env.clone(),
        }))
    }
}

#[cfg(unix)]
fn is_executable(program: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(program)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_program: &Path) -> bool {
    true
}

#[derive(Serialize)]
struct InvocationRequest {
    event: Value,
    context: Value,
}

#[derive(Deserialize)]
struct InvocationResponse {
    #[serde(default)]
    error: Value,
    #[serde(default)]
    result: Value,
}

struct ProcessHandler {
    program: PathBuf,
    export: String,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
}

#[async_trait]
impl Handler for ProcessHandler {
    async fn invoke(&self, event: Value, context: Value) -> std::result::Result<Value, InvokeError> {
        let request = serde_json::to_vec(&InvocationRequest { event, context })
            .map_err(|e| format!("failed to encode invocation: {e}"))?;

        let mut child = Command::new(&self.program)
            .arg(&self.export)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                error!(error = ?e, program = %self.program.display(), "Failed to start handler");
                format!("failed to start {}: {e}", self.program.display())
            })?;

        // Written while stdout and stderr are drained; handlers may log before reading input.
        let stdin = child.stdin.take();
        let send = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&request).await {
                    // the handler may exit without reading its input
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                        return Err(format!("failed to send invocation: {e}"));
                    }
                    _ => {}
                }
            }
            Ok(())
        };
        let (sent, output) = tokio::join!(send, child.wait_with_output());
        let output = output.map_err(|e| format!("failed to wait for handler: {e}"))?;
        sent?;

        if output.status.code() == Some(UNKNOWN_EXPORT_EXIT_CODE) {
            return Err(InvokeError::UnknownExport(format!(
                "module {} has no export \"{}\"",
                self.program.display(),
                self.export
            )));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InvokeError::Failed(format!(
                "handler exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let response: InvocationResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("handler returned invalid output: {e}"))?;
        match response.error {
            Value::Null => Ok(response.result),
            Value::String(message) => Err(InvokeError::Failed(message)),
            other => Err(InvokeError::Failed(other.to_string())),
        }
    }
}
