pub mod cli;
pub mod commands;
pub mod lambda_client;

pub use cli::{run, Cli, Commands};
