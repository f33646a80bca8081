#![doc = "lambda-deploy-core: core logic library for lambda-deploy."]

//! This crate contains the document model, loaders, deploy decision logic and the local test
//! harness for lambda-deploy. It has no AWS dependency: the remote function API is the
//! [`contract::LambdaApi`] trait, implemented for real in the CLI crate and by mocks in tests.
//!
//! # Usage
//! Add this as a dependency for anything that needs to load, compare or deploy a function
//! description, or run a handler against recorded fixtures.

pub mod code_update;
pub mod constants;
pub mod contract;
pub mod deploy;
pub mod equality;
pub mod error;
pub mod invoke;
pub mod loader;
pub mod model;
pub mod store;
pub mod test_runner;

pub use error::{DeployError, Result};
