//! Process-wide read-only constants: document names, result messages and default values.

/// Function configuration document.
pub const CONFIG_FILE: &str = "lambda-config.json";

/// Credentials, role and environment. Keep out of version control.
pub const SECRETS_FILE: &str = "lambda-secrets.json";

/// Recorded context/event fixtures for the local test harness.
pub const TESTS_FILE: &str = "lambda-tests.json";

pub const INIT_COMPLETE: &str = "init complete";
pub const DEPLOY_COMPLETE: &str = "deploy complete";
pub const FUNCTION_CREATED: &str = "function created";
pub const CODE_UP_TO_DATE: &str = "already up to date";
pub const CODE_UPDATED: &str = "code updated";
pub const TESTS_PASSED: &str = "tests passed";

pub const DEFAULT_ARCHIVE_NAME: &str = "lambda.zip";
pub const DEFAULT_HANDLER: &str = "bootstrap.handler";
pub const DEFAULT_MEMORY_SIZE: i32 = 128;
pub const DEFAULT_TIMEOUT: i32 = 3;

/// Exit status a process handler uses when the requested export does not exist.
pub const UNKNOWN_EXPORT_EXIT_CODE: i32 = 127;

/// Source name attached to explicit credentials from the secrets document.
pub const CREDENTIALS_PROVIDER_NAME: &str = "lambda-secrets";

/// Line ending appended to every written document.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";
