//! Local test harness: replays every recorded event against the handler with its test case's
//! context.
//!
//! All invocations are started together as separate tasks. The run succeeds only when every
//! invocation does; the first failure observed is returned and the remaining invocations keep
//! running to completion in the background.

use std::path::Path;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{DeployError, Result};
use crate::invoke::{HandlerLoader, HandlerRef};
use crate::model::TestCase;

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub test_case: String,
    pub event_index: usize,
    pub result: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestReport {
    pub invocations: Vec<InvocationResult>,
}

/// Runs `cases` against `handler` (`module.exportName`) resolved through `loader` in `dir`.
///
/// The handler name is checked before anything is loaded.
pub async fn run_tests<L>(
    loader: &L,
    dir: &Path,
    handler: &str,
    cases: &[TestCase],
) -> Result<TestReport>
where
    L: HandlerLoader + ?Sized,
{
    let handler_ref = HandlerRef::parse(handler).inspect_err(|e| {
        error!(error = %e, "[TEST] Invalid handler");
    })?;
    let callable = loader.load(dir, &handler_ref).inspect_err(|e| {
        error!(error = %e, handler = %handler_ref, "[TEST] Failed to load handler");
    })?;
    info!(handler = %handler_ref, cases = cases.len(), "[TEST] Running test cases");

    // Each invocation is its own task, so one failing does not cancel the others.
    let mut tasks = Vec::new();
    for (case_index, case) in cases.iter().enumerate() {
        let label = case.label(case_index);
        for (event_index, event) in case.events.iter().enumerate() {
            let callable = callable.clone();
            let label = label.clone();
            let event = event.clone();
            let context = case.context.clone();
            tasks.push(tokio::spawn(async move {
                match callable.invoke(event, context).await {
                    Ok(result) => {
                        info!(test_case = %label, event_index, "[TEST] Invocation succeeded");
                        Ok(InvocationResult {
                            test_case: label,
                            event_index,
                            result,
                        })
                    }
                    Err(e) => {
                        error!(test_case = %label, event_index, error = %e, "[TEST] Invocation failed");
                        Err(DeployError::from(e))
                    }
                }
            }));
        }
    }

    let invocations = try_join_all(tasks.into_iter().map(|task| async move {
        task.await
            .map_err(|e| DeployError::Invocation(format!("invocation task failed: {e}")))?
    }))
    .await?;
    info!(invocations = invocations.len(), "[TEST] All invocations succeeded");
    Ok(TestReport { invocations })
}
