use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::tempdir;

#[test]
fn init_cli_creates_documents_in_dir() {
    let dir = tempdir().expect("Creating temp dir failed");

    let mut cmd = Command::cargo_bin("lambda-deploy").expect("Binary exists");
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("init complete").and(predicate::str::contains("created")));

    for name in ["lambda-config.json", "lambda-secrets.json", "lambda-tests.json"] {
        assert!(dir.path().join(name).is_file(), "{name} should exist");
    }

    // A second run finds everything in place.
    let mut cmd = Command::cargo_bin("lambda-deploy").expect("Binary exists");
    cmd.arg("init").arg("--dir").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("exists").and(predicate::str::contains("created").not()));
}

#[test]
fn test_cli_rejects_handler_without_export() {
    let dir = tempdir().expect("Creating temp dir failed");
    write(
        dir.path().join("lambda-config.json"),
        r#"{
  "archiveName": "lambda.zip",
  "FunctionName": "orders-intake",
  "Description": "",
  "Handler": "indexonlyexport",
  "Publish": false,
  "Runtime": "provided.al2023",
  "MemorySize": 128,
  "Timeout": 3
}
"#,
    )
    .expect("Writing config failed");

    let mut cmd = Command::cargo_bin("lambda-deploy").expect("Binary exists");
    cmd.arg("test").arg("--dir").arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid handler"));
}

#[test]
fn deploy_cli_fails_without_documents() {
    let dir = tempdir().expect("Creating temp dir failed");

    let mut cmd = Command::cargo_bin("lambda-deploy").expect("Binary exists");
    cmd.arg("deploy").arg("--dir").arg(dir.path()).arg("--create");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use lambda_deploy::cli::{run, Cli, Commands, DirArg};

    let dir = tempdir().expect("Creating temp dir failed");
    let cli = Cli {
        command: Commands::Init {
            dir: DirArg {
                dir: dir.path().to_path_buf(),
            },
        },
    };

    run(cli).await.expect("init should succeed");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
