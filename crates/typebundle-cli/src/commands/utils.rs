//! Shared utilities for command implementations.

use crate::config::TypebundleConfig;
use crate::error::{BuildError, CliError, Result};
use std::path::{Path, PathBuf};

/// Resolve a path relative to a working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Absolute package root for `config`.
pub fn get_cwd(config: &TypebundleConfig) -> Result<PathBuf> {
    let base = std::env::current_dir()?;
    let cwd = std::path::absolute(config.resolve_cwd(&base))?;

    if !cwd.exists() {
        return Err(CliError::FileNotFound(cwd));
    }
    if !cwd.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Working directory is not a directory: {}",
            cwd.display()
        )));
    }

    Ok(cwd)
}

/// The output and types directories must not be existing files.
pub fn validate_output_dirs(config: &TypebundleConfig, cwd: &Path) -> Result<()> {
    let dirs = std::iter::once(&config.output).chain(config.types.as_ref());
    for dir in dirs {
        let resolved = resolve_path(dir, cwd);
        if resolved.exists() && !resolved.is_dir() {
            return Err(BuildError::NotADirectory(resolved).into());
        }
    }
    Ok(())
}

/// `path` relative to `cwd` for display, or unchanged when outside it.
pub fn display_path(path: &Path, cwd: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .display()
        .to_string()
}
