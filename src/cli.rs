//! This module implements the CLI interface for lambda-deploy: command parsing, argument
//! exposure and the async entrypoint used by `main` and by integration tests.
//!
//! All document handling, deploy decisions and the test harness live in the
//! [`lambda-deploy-core`] crate. This module is CLI glue only.
//!
//! ## How To Use
//! - For command-line users: run the installed `lambda-deploy` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`lambda-deploy-core`]: ../../lambda-deploy-core/

use crate::commands;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lambda_deploy_core::constants;
use lambda_deploy_core::deploy::DeployOptions;
use std::path::PathBuf;

/// CLI for lambda-deploy: deploy and test a single Lambda function.
#[derive(Parser)]
#[clap(
    name = "lambda-deploy",
    version,
    about = "Deploy a single AWS Lambda function from local JSON documents and test its handler locally"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct DirArg {
    /// Directory holding lambda-config.json, lambda-secrets.json and lambda-tests.json
    #[clap(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create any missing config, secrets and tests documents with default contents
    Init {
        #[clap(flatten)]
        dir: DirArg,
    },
    /// Create or update the function described by the local documents
    Deploy {
        #[clap(flatten)]
        dir: DirArg,
        /// Create the function if it does not exist
        #[clap(long)]
        create: bool,
        /// Overwrite the deployed configuration with the local one
        #[clap(long)]
        update_config: bool,
    },
    /// Run the handler locally against every recorded test event
    Test {
        #[clap(flatten)]
        dir: DirArg,
        /// Test document to use instead of lambda-tests.json
        #[clap(long)]
        file: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let message = match cli.command {
        Commands::Init { dir } => {
            tracing::info!(command = "init", dir = %dir.dir.display(), "Initialising documents");
            let report = commands::init(&dir.dir).await?;
            for path in &report.created {
                println!("created {}", path.display());
            }
            for path in &report.existing {
                println!("exists  {}", path.display());
            }
            constants::INIT_COMPLETE.to_string()
        }
        Commands::Deploy {
            dir,
            create,
            update_config,
        } => {
            let options = DeployOptions {
                create,
                update_config,
            };
            tracing::info!(command = "deploy", ?options, "Starting deploy");
            match commands::deploy(&dir.dir, options).await {
                Ok(outcome) => {
                    tracing::info!(command = "deploy", ?outcome, "Deploy complete");
                    outcome.to_string()
                }
                Err(e) => {
                    tracing::error!(command = "deploy", error = %e, "Deploy failed");
                    return Err(e.into());
                }
            }
        }
        Commands::Test { dir, file } => {
            tracing::info!(command = "test", "Running local tests");
            match commands::test(&dir.dir, file.as_deref()).await {
                Ok(report) => {
                    for invocation in &report.invocations {
                        println!(
                            "{} [event {}]: {}",
                            invocation.test_case, invocation.event_index, invocation.result
                        );
                    }
                    format!(
                        "{} ({} invocations)",
                        constants::TESTS_PASSED,
                        report.invocations.len()
                    )
                }
                Err(e) => {
                    tracing::error!(command = "test", error = %e, "Tests failed");
                    return Err(e.into());
                }
            }
        }
    };

    println!("{message}");
    Ok(())
}
