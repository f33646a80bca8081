#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use lambda_deploy_core::invoke::{HandlerLoader, HandlerRef, InvokeError, ProcessLoader};
use lambda_deploy_core::model::TestCase;
use lambda_deploy_core::test_runner::run_tests;
use lambda_deploy_core::DeployError;
use serde_json::json;
use tempfile::tempdir;

const SCRIPT: &str = r#"#!/bin/sh
input=$(cat)
case "$1" in
  handler)
    if echo "$input" | grep -q '"id":7'; then saw=true; else saw=false; fi
    printf '{"error": null, "result": {"stage": "%s", "sawEvent": %s}}\n' "$STAGE" "$saw"
    ;;
  reject)
    printf '{"error": "order rejected", "result": null}\n'
    ;;
  crash)
    echo "boom" >&2
    exit 3
    ;;
  garbled)
    printf 'not json'
    ;;
  *)
    exit 127
    ;;
esac
"#;

// Logs more than a pipe buffer before it reads its input.
const CHATTY: &str = r#"#!/bin/sh
head -c 200000 /dev/zero | tr '\0' x >&2
cat >/dev/null
printf '{"error": null, "result": 1}'
"#;

fn write_script(path: &Path, body: &str, mode: u32) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

// A single test, with every script written up front, so no script is being written while a
// process is spawned.
#[tokio::test]
async fn executable_modules_are_invoked_with_the_export_name() {
    let dir = tempdir().unwrap();
    write_script(&dir.path().join("bootstrap"), SCRIPT, 0o755);
    write_script(&dir.path().join("chatty"), CHATTY, 0o755);
    write_script(&dir.path().join("plain"), SCRIPT, 0o644);

    let env = BTreeMap::from([("STAGE".to_string(), "prod".to_string())]);
    let loader = ProcessLoader::new().with_env(env);

    let missing = loader.load(dir.path(), &HandlerRef::parse("absent.handler").unwrap());
    assert!(matches!(missing, Err(DeployError::InvalidHandler(m)) if m.contains("absent")));

    let not_executable = loader.load(dir.path(), &HandlerRef::parse("plain.handler").unwrap());
    assert!(
        matches!(not_executable, Err(DeployError::InvalidHandler(m)) if m.contains("not executable"))
    );

    let handler = loader
        .load(dir.path(), &HandlerRef::parse("bootstrap.handler").unwrap())
        .unwrap();
    let result = handler
        .invoke(json!({"id": 7}), json!({"awsRequestId": "req-1"}))
        .await
        .expect("handler should succeed");
    assert_eq!(result, json!({"stage": "prod", "sawEvent": true}));

    let rejecting = loader
        .load(dir.path(), &HandlerRef::parse("bootstrap.reject").unwrap())
        .unwrap();
    assert_eq!(
        rejecting.invoke(json!({}), json!({})).await.unwrap_err(),
        InvokeError::Failed("order rejected".to_string())
    );

    let crashing = loader
        .load(dir.path(), &HandlerRef::parse("bootstrap.crash").unwrap())
        .unwrap();
    let err = crashing.invoke(json!({}), json!({})).await.unwrap_err();
    assert!(err.to_string().contains("boom"), "got: {err}");

    let garbled = loader
        .load(dir.path(), &HandlerRef::parse("bootstrap.garbled").unwrap())
        .unwrap();
    let err = garbled.invoke(json!({}), json!({})).await.unwrap_err();
    assert!(err.to_string().contains("invalid output"), "got: {err}");

    let chatty = loader
        .load(dir.path(), &HandlerRef::parse("chatty.handler").unwrap())
        .unwrap();
    let large_event = json!({"payload": "y".repeat(200_000)});
    let result = tokio::time::timeout(Duration::from_secs(5), chatty.invoke(large_event, json!({})))
        .await
        .expect("a handler logging before reading its input should not stall")
        .expect("handler should succeed");
    assert_eq!(result, json!(1));

    let unknown = vec![TestCase {
        name: None,
        context: json!({}),
        events: vec![json!({"id": 7})],
    }];
    let err = run_tests(&loader, dir.path(), "bootstrap.absentExport", &unknown)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, DeployError::InvalidHandler(m) if m.contains("absentExport")),
        "got: {err}"
    );

    let cases = vec![TestCase {
        name: Some("orders".to_string()),
        context: json!({}),
        events: vec![json!({"id": 7}), json!({"id": 8})],
    }];
    let report = run_tests(&loader, dir.path(), "bootstrap.handler", &cases)
        .await
        .unwrap();
    assert_eq!(report.invocations.len(), 2);
    assert_eq!(report.invocations[1].result["sawEvent"], json!(false));
}
