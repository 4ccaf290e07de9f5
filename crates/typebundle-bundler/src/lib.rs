//! # typebundle-bundler
//!
//! Library builds for TypeScript/JavaScript packages on top of Rolldown.
//!
//! The crate turns a package directory plus an input path or glob into a
//! [`BuildPlan`]: one [`EntryPlan`] per resolved entry, each carrying the
//! external-module policy derived from `package.json`, the output files to
//! produce (CommonJS always, ESM on request) and the declaration settings.
//! [`run`] executes the plan with Rolldown and writes bundles plus `.d.ts`
//! files to disk.
//!
//! ## Quick Start
//!
//! ```no_run
//! use typebundle_bundler::{BundlerConfig, BuildPlan, NodeTarget};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BundlerConfig::new("src/index.ts", std::env::current_dir()?)
//!     .out_dir("dist")
//!     .esm(true)
//!     .target(NodeTarget::parse("18")?);
//!
//! let plan = BuildPlan::assemble(&config)?;
//! let report = typebundle_bundler::run(&plan).await?;
//! for entry in &report.entries {
//!     println!("{} -> {} files", entry.entry.display(), entry.outputs.len());
//! }
//! # Ok(()) }
//! ```

use std::path::PathBuf;

pub mod builders;
pub mod diagnostics;
pub mod dts;
pub mod entries;
pub mod output;
pub mod package;
pub mod plugins;
pub mod target;

pub use builders::{
    BuildPlan, BuildReport, BundlerConfig, EntryBuild, EntryPlan, EntryReport, ModuleFormat,
    OutputTarget, build_entry, run, run_each,
};
pub use dts::DeclarationBackend;
pub use entries::resolve_entries;
pub use output::EmittedFile;
pub use package::PackageJson;
pub use plugins::{ExternalPolicy, Resolution};
pub use target::{NodeTarget, is_node_builtin};

// Re-export the Rolldown types that appear in this crate's public API
pub use rolldown::{OutputFormat, Platform};
pub use rolldown_plugin::__inner::SharedPluginable;

/// Error types for typebundle-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from Rolldown bundler.
    #[error("Rolldown bundler error: {}", format_bundler_error(.0))]
    Bundler(Vec<diagnostics::ExtractedDiagnostic>),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No package.json in the working directory.
    #[error("package.json not found in {}", .dir.display())]
    PackageJsonNotFound { dir: PathBuf },

    /// package.json exists but cannot be used.
    #[error("Invalid package.json at {}: {message}", .path.display())]
    InvalidPackageJson { path: PathBuf, message: String },

    /// A literal entry path does not exist.
    #[error("Entry not found: {input} (relative to {})", .cwd.display())]
    EntryNotFound { input: String, cwd: PathBuf },

    /// A glob input matched nothing.
    #[error("No entries match pattern: {pattern}")]
    NoEntries { pattern: String },

    /// Unrecognised Node.js target.
    #[error("Invalid Node.js target: {0}")]
    InvalidTarget(String),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Declaration generation failed for a module.
    #[error("Declaration generation failed for {file}: {message}")]
    Declarations { file: String, message: String },

    /// The external type checker exited unsuccessfully.
    #[error("Type checker failed ({status})")]
    TypeChecker { status: String, output: String },

    /// One or more entries of a multi-entry run failed.
    #[error("Build failed for {} entries:\n{}", .failures.len(), .failures.join("\n"))]
    BuildFailed { failures: Vec<String> },
}

/// Result type alias for typebundle-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error.
    ///
    /// Extracts structured diagnostics from Rolldown's error types.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_rolldown_error(error))
    }
}

/// Format bundler error diagnostics for display.
fn format_bundler_error(diagnostics: &[diagnostics::ExtractedDiagnostic]) -> String {
    match diagnostics {
        [] => "Unknown bundler error".to_string(),
        [diag] => format!("{}: {}", diag.kind, diag.message),
        _ => format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO_ERROR",
            Error::PackageJsonNotFound { .. } => "PACKAGE_JSON_NOT_FOUND",
            Error::InvalidPackageJson { .. } => "INVALID_PACKAGE_JSON",
            Error::EntryNotFound { .. } => "ENTRY_NOT_FOUND",
            Error::NoEntries { .. } => "NO_ENTRIES",
            Error::InvalidTarget(_) => "INVALID_TARGET",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::Declarations { .. } => "DECLARATIONS_FAILED",
            Error::TypeChecker { .. } => "TYPE_CHECKER_FAILED",
            Error::BuildFailed { .. } => "BUILD_FAILED",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::PackageJsonNotFound { .. } => Some(Box::new(
                "Run typebundle from the package root, or pass --cwd <dir>.",
            )),
            Error::InvalidPackageJson { .. } => {
                Some(Box::new("Check package.json for syntax errors."))
            }
            Error::EntryNotFound { .. } => Some(Box::new(
                "Check that the input path exists, or quote a glob pattern like 'src/*.ts'.",
            )),
            Error::NoEntries { .. } => Some(Box::new(
                "Glob patterns are matched relative to the working directory; node_modules is never searched.",
            )),
            Error::InvalidTarget(_) => Some(Box::new(
                "Use a Node.js version such as 18, 20.11 or node18, or 'current' / 'esnext'.",
            )),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it's within the output directory and doesn't contain '..' components.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::Declarations { .. } => Some(Box::new(
                "Isolated declarations need explicit types on exports. Add annotations or use --dts-backend tsc.",
            )),
            Error::TypeChecker { output, .. } => Some(Box::new(output.clone())),
            Error::Bundler(diagnostics) => {
                if diagnostics.len() == 1 {
                    diagnostics[0]
                        .help
                        .as_ref()
                        .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
                } else {
                    Some(Box::new(
                        "Multiple bundler errors occurred. See details below.".to_string(),
                    ))
                }
            }
            _ => None,
        }
    }
}
