//! Error handling for the typebundle CLI.
//!
//! - [`CliError`] is what commands return
//! - [`ConfigError`] and [`BuildError`] carry domain detail and a hint
//!
//! `main` turns a `CliError` into a `miette::Report` with
//! [`cli_error_to_miette`].

mod report;

use std::path::PathBuf;
use thiserror::Error;

pub use report::{build_error_to_miette, bundler_error_to_miette, cli_error_to_miette};

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (invalid file, bad values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build failures
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Errors from the bundler library, kept intact for diagnostics
    #[error(transparent)]
    Bundler(#[from] typebundle_bundler::Error),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicit config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a typebundle.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// Config sources could not be merged or deserialized
    #[error("Invalid configuration: {0}\n\nHint: Check typebundle.config.json and TYPEBUNDLE_* variables for typos and value types")]
    Extract(String),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Build process errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An output path exists but is a file
    #[error("Output path exists but is not a directory: {}\n\nHint: Remove the file or choose another --output/--types", .0.display())]
    NotADirectory(PathBuf),

    /// Watch mode could not start or continue
    #[error("Watch mode stopped: {0}")]
    WatchFailed(String),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
