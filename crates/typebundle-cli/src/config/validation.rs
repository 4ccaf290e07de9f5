use std::path::{Component, Path};
use typebundle_bundler::NodeTarget;

use crate::config::TypebundleConfig;
use crate::error::{ConfigError, Result};

/// Directories typebundle refuses to write into.
const SYSTEM_DIRS: &[&str] = &[
    "/bin", "/boot", "/dev", "/etc", "/lib", "/lib64", "/proc", "/sbin", "/sys", "/usr", "/var",
];

impl TypebundleConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        match self.input.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(ConfigError::MissingField {
                    field: "input".to_string(),
                    hint: "Pass an entry file, e.g. `typebundle src/index.ts`, or set \"input\" in typebundle.config.json".to_string(),
                }
                .into());
            }
            Some(_) => {}
        }

        if NodeTarget::parse(&self.target).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "target".to_string(),
                value: self.target.clone(),
                hint: "Use a Node.js version such as 18 or 20.11, 'current' or 'esnext'".to_string(),
            }
            .into());
        }

        validate_output_dir("output", &self.output)?;
        if let Some(types) = &self.types {
            validate_output_dir("types", types)?;
        }

        Ok(())
    }
}

/// Reject the filesystem root and well-known system directories.
pub fn validate_output_dir(field: &str, dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: String::new(),
            hint: "Output directory cannot be empty".to_string(),
        }
        .into());
    }

    let is_root = dir.is_absolute()
        && dir
            .components()
            .all(|c| matches!(c, Component::RootDir | Component::Prefix(_)));
    let is_system = SYSTEM_DIRS.iter().any(|sys| dir == Path::new(sys));

    if is_root || is_system {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: dir.display().to_string(),
            hint: "Refusing to write into a system directory; choose a directory inside the package".to_string(),
        }
        .into());
    }

    Ok(())
}
