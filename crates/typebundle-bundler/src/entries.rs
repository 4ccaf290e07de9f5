//! Entry resolution.
//!
//! The positional input is either a file path or a glob. Globs use gitignore
//! syntax anchored at the working directory, so `src/*.ts` only matches files
//! directly under `src/` and `src/**/*.ts` descends.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use path_clean::PathClean;

use crate::{Error, Result};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Whether `input` should be treated as a glob pattern.
pub fn is_glob(input: &str) -> bool {
    input.contains(GLOB_META)
}

/// Resolve `input` against `cwd` into absolute entry paths.
///
/// Literal paths must exist. Glob results are sorted and never include files
/// under `node_modules`, hidden directories, or any of `exclude` (the build's
/// own output directories).
pub fn resolve_entries(input: &str, cwd: &Path, exclude: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !is_glob(input) {
        let path = cwd.join(input).clean();
        if !path.is_file() {
            return Err(Error::EntryNotFound {
                input: input.to_string(),
                cwd: cwd.to_path_buf(),
            });
        }
        return Ok(vec![path]);
    }

    let pattern = input.strip_prefix("./").unwrap_or(input);
    let anchored = if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    };

    let overrides = OverrideBuilder::new(cwd)
        .add(&anchored)
        .and_then(|builder| builder.build())
        .map_err(|e| Error::InvalidConfig(format!("Invalid glob '{input}': {e}")))?;

    let exclude: Vec<PathBuf> = exclude
        .iter()
        .map(|dir| dir.clean())
        .filter(|dir| dir.as_path() != cwd)
        .collect();

    let walker = WalkBuilder::new(cwd)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .filter_entry(move |entry| {
            entry.file_name() != "node_modules" && !exclude.iter().any(|dir| entry.path() == dir)
        })
        .build();

    let mut entries = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable path while resolving entries");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        if overrides.matched(entry.path(), false).is_whitelist() {
            entries.push(entry.path().to_path_buf().clean());
        }
    }

    entries.sort();
    entries.dedup();

    if entries.is_empty() {
        return Err(Error::NoEntries {
            pattern: input.to_string(),
        });
    }

    tracing::debug!(pattern = input, count = entries.len(), "resolved entries");
    Ok(entries)
}

/// Output base name for an entry (`src/cli.ts` → `cli`).
pub fn entry_name(entry: &Path) -> String {
    entry
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index")
        .to_string()
}
