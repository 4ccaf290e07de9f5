//! package.json loading.
//!
//! Only the fields that decide what stays external and how the package's own
//! index is addressed are parsed; everything else in the manifest is ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::builders::ModuleFormat;
use crate::{Error, Result};

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    /// Package name
    pub name: Option<String>,
    /// CommonJS entry point
    pub main: Option<String>,
    /// ES module entry point
    pub module: Option<String>,
    /// Bundled declarations entry
    #[serde(alias = "typings")]
    pub types: Option<String>,
    /// Production dependencies
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Peer dependencies
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// Load `package.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("package.json");

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::PackageJsonNotFound {
                    dir: dir.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.len() > MAX_PACKAGE_JSON_SIZE {
            return Err(Error::InvalidPackageJson {
                path,
                message: format!(
                    "file exceeds maximum size of {}MB",
                    MAX_PACKAGE_JSON_SIZE / 1024 / 1024
                ),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let mut pkg = Self::parse(&content).map_err(|e| Error::InvalidPackageJson {
            path: path.clone(),
            message: e.to_string(),
        })?;
        pkg.path = path;

        tracing::debug!(
            name = pkg.name.as_deref().unwrap_or("<unnamed>"),
            dependencies = pkg.dependencies.len(),
            peer_dependencies = pkg.peer_dependencies.len(),
            "loaded package.json"
        );

        Ok(pkg)
    }

    /// Parse package.json contents.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Package names that must never be inlined, sorted and de-duplicated.
    pub fn external_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependencies
            .keys()
            .chain(self.peer_dependencies.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Relative import that replaces the bare `.` specifier in multi-entry builds.
    ///
    /// CommonJS output points at `main`; ESM output prefers `module` and falls
    /// back to `main`.
    pub fn local_index_for(&self, format: ModuleFormat) -> Option<String> {
        let field = match format {
            ModuleFormat::Cjs => self.main.as_deref(),
            ModuleFormat::Esm => self.module.as_deref().or(self.main.as_deref()),
        }?;

        let base = Path::new(field).file_name()?.to_str()?;
        Some(format!("./{base}"))
    }
}
