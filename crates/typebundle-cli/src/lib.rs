//! typebundle CLI - library builds for TypeScript packages.
//!
//! The binary resolves a layered configuration, assembles a build plan with
//! `typebundle-bundler` and either builds once or keeps rebuilding on file
//! changes.
//!
//! - [`cli`] - argument definitions
//! - [`config`] - defaults, `typebundle.config.json`, environment and flags
//! - [`commands`] - one-shot build and watch mode
//! - [`watch`] - file watcher and build event dispatch
//! - [`error`] - error types with actionable messages
//! - [`logger`] / [`ui`] - tracing setup and terminal output
//!
//! # Example
//!
//! ```rust
//! use typebundle_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;
pub mod watch;

pub use error::{BuildError, CliError, ConfigError, Result};
