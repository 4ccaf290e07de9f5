//! Configuration with multi-source loading.
//!
//! Priority: CLI flags > `TYPEBUNDLE_*` environment variables >
//! `typebundle.config.json` > defaults.

mod defaults;
mod loading;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use typebundle_bundler::{BundlerConfig, DeclarationBackend, NodeTarget};

pub use defaults::*;
pub use loading::CONFIG_FILE_NAME;
pub use validation::validate_output_dir;

use crate::error::{ConfigError, Result};

/// Resolved typebundle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypebundleConfig {
    /// Entry file or glob pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Output directory for bundles
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Minify output
    #[serde(default)]
    pub compress: bool,

    /// Also emit `<name>.mjs`
    #[serde(default)]
    pub esm: bool,

    /// Node.js target (`current`, `esnext`, `18`, ...)
    #[serde(default = "default_target")]
    pub target: String,

    /// Declaration directory, defaults to `output`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<PathBuf>,

    /// Rebuild on change
    #[serde(default)]
    pub watch: bool,

    /// Generate declarations
    #[serde(default = "default_dts")]
    pub dts: bool,

    /// Declaration backend
    #[serde(default)]
    pub dts_backend: DeclarationBackend,

    /// Package root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Default for TypebundleConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: default_output(),
            compress: false,
            esm: false,
            target: default_target(),
            types: None,
            watch: false,
            dts: default_dts(),
            dts_backend: DeclarationBackend::default(),
            cwd: None,
        }
    }
}

impl TypebundleConfig {
    /// Package root, resolved against `base`.
    pub fn resolve_cwd(&self, base: &Path) -> PathBuf {
        match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clone(),
            Some(cwd) => base.join(cwd),
            None => base.to_path_buf(),
        }
    }

    /// Convert into the bundler's configuration for package root `cwd`.
    pub fn to_bundler_config(&self, cwd: &Path) -> Result<BundlerConfig> {
        let input = self.input.clone().ok_or_else(|| ConfigError::MissingField {
            field: "input".to_string(),
            hint: "Pass an entry file, e.g. `typebundle src/index.ts`, or set \"input\" in typebundle.config.json".to_string(),
        })?;

        let target = NodeTarget::parse(&self.target).map_err(|_| ConfigError::InvalidValue {
            field: "target".to_string(),
            value: self.target.clone(),
            hint: "Use a Node.js version such as 18 or 20.11, 'current' or 'esnext'".to_string(),
        })?;

        let mut config = BundlerConfig::new(input, cwd)
            .out_dir(&self.output)
            .esm(self.esm)
            .compress(self.compress)
            .target(target)
            .declarations(self.dts.then_some(self.dts_backend));
        if let Some(types) = &self.types {
            config = config.types_dir(types);
        }

        Ok(config)
    }
}
