//! Build planning.
//!
//! [`BuildPlan::assemble`] turns a [`BundlerConfig`] into everything a build
//! needs: the resolved entries, the external policy derived from
//! `package.json`, the output files per entry and the declaration settings.
//! Nothing is written to disk here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use rolldown::OutputFormat;
use rustc_hash::FxHashMap;

use crate::dts::DeclarationBackend;
use crate::entries::{entry_name, resolve_entries};
use crate::package::PackageJson;
use crate::plugins::{ExternalPolicy, TranspilePlugin};
use crate::target::NodeTarget;
use crate::{Error, Result};

/// Module format of one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleFormat {
    Cjs,
    Esm,
}

impl ModuleFormat {
    /// Output file extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Cjs => ".js",
            Self::Esm => ".mjs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cjs => "cjs",
            Self::Esm => "esm",
        }
    }

    pub fn to_rolldown(self) -> OutputFormat {
        match self {
            Self::Cjs => OutputFormat::Cjs,
            Self::Esm => OutputFormat::Esm,
        }
    }

    /// `exports` conditions used when resolving dependencies for this format.
    pub fn condition_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Cjs => &["node", "require", "default"],
            Self::Esm => &["node", "import", "module", "default"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }

    /// `package.json` fields consulted, in order, for packages without `exports`.
    pub fn main_fields(&self) -> Vec<String> {
        let fields: &[&str] = match self {
            Self::Cjs => &["main"],
            Self::Esm => &["module", "main"],
        };
        fields.iter().map(|s| s.to_string()).collect()
    }
}

/// User-facing build configuration.
///
/// Paths are interpreted relative to `cwd`.
#[derive(Debug, Clone)]
pub struct BundlerConfig {
    /// Entry file or glob pattern
    pub input: String,
    /// Package root containing `package.json`
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    /// Declaration directory, defaults to `out_dir`
    pub types_dir: Option<PathBuf>,
    /// Also emit `<name>.mjs`
    pub esm: bool,
    /// Minify output
    pub compress: bool,
    pub target: NodeTarget,
    /// `None` disables declarations
    pub declarations: Option<DeclarationBackend>,
}

impl BundlerConfig {
    pub fn new(input: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            cwd: cwd.into(),
            out_dir: PathBuf::from("dist"),
            types_dir: None,
            esm: false,
            compress: false,
            target: NodeTarget::Current,
            declarations: Some(DeclarationBackend::Isolated),
        }
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn types_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.types_dir = Some(dir.into());
        self
    }

    pub fn esm(mut self, enabled: bool) -> Self {
        self.esm = enabled;
        self
    }

    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn target(mut self, target: NodeTarget) -> Self {
        self.target = target;
        self
    }

    pub fn declarations(mut self, backend: Option<DeclarationBackend>) -> Self {
        self.declarations = backend;
        self
    }
}

/// One output file of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub format: ModuleFormat,
    /// File name relative to the output directory
    pub file_name: String,
}

/// Everything needed to build a single entry.
#[derive(Debug, Clone)]
pub struct EntryPlan {
    /// Absolute entry path
    pub entry: PathBuf,
    /// Output base name
    pub name: String,
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub types_dir: PathBuf,
    pub outputs: Vec<OutputTarget>,
    pub policy: Arc<ExternalPolicy>,
    pub compress: bool,
    /// Resolved target, never `Current`
    pub target: NodeTarget,
    pub declarations: Option<DeclarationBackend>,
}

/// A fully resolved build.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub cwd: PathBuf,
    pub package: PackageJson,
    pub out_dir: PathBuf,
    pub types_dir: PathBuf,
    pub entries: Vec<EntryPlan>,
}

impl BuildPlan {
    /// Resolve `config` against the filesystem.
    ///
    /// Fails when `package.json` is missing, the input matches nothing, two
    /// entries would write the same output file, or the target is unknown
    /// to the transformer.
    pub fn assemble(config: &BundlerConfig) -> Result<Self> {
        let cwd = std::path::absolute(&config.cwd)?.clean();
        let package = PackageJson::load(&cwd)?;
        let out_dir = resolve_dir(&cwd, &config.out_dir);
        let types_dir = config
            .types_dir
            .as_deref()
            .map(|dir| resolve_dir(&cwd, dir))
            .unwrap_or_else(|| out_dir.clone());

        let exclude = [out_dir.clone(), types_dir.clone()];
        let entries = resolve_entries(&config.input, &cwd, &exclude)?;
        check_unique_names(&entries)?;

        let policy = Arc::new(ExternalPolicy::new(&package, &entries)?);

        let target = config.target.resolve();
        if let Some(oxc_target) = target.oxc_target() {
            TranspilePlugin::new(oxc_target)?;
        }

        let entries = entries
            .into_iter()
            .map(|entry| {
                let name = entry_name(&entry);
                let mut outputs = vec![OutputTarget {
                    format: ModuleFormat::Cjs,
                    file_name: format!("{name}{}", ModuleFormat::Cjs.extension()),
                }];
                if config.esm {
                    outputs.push(OutputTarget {
                        format: ModuleFormat::Esm,
                        file_name: format!("{name}{}", ModuleFormat::Esm.extension()),
                    });
                }

                EntryPlan {
                    entry,
                    name,
                    cwd: cwd.clone(),
                    out_dir: out_dir.clone(),
                    types_dir: types_dir.clone(),
                    outputs,
                    policy: Arc::clone(&policy),
                    compress: config.compress,
                    target,
                    declarations: config.declarations,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            cwd = %cwd.display(),
            entries = entries.len(),
            externals = policy.dependency_pattern().unwrap_or("<none>"),
            "assembled build plan"
        );

        Ok(Self {
            cwd,
            package,
            out_dir,
            types_dir,
            entries,
        })
    }

    /// Entry paths in build order.
    pub fn entry_paths(&self) -> Vec<&Path> {
        self.entries.iter().map(|e| e.entry.as_path()).collect()
    }

    /// Whether `path` is one of the build's outputs or declarations.
    pub fn is_output_path(&self, path: &Path) -> bool {
        path.starts_with(&self.out_dir) || path.starts_with(&self.types_dir)
    }
}

fn resolve_dir(cwd: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.clean()
    } else {
        cwd.join(dir).clean()
    }
}

fn check_unique_names(entries: &[PathBuf]) -> Result<()> {
    let mut seen: FxHashMap<String, &Path> = FxHashMap::default();
    for entry in entries {
        let name = entry_name(entry);
        if let Some(previous) = seen.insert(name.clone(), entry) {
            return Err(Error::InvalidConfig(format!(
                "Entries '{}' and '{}' would both be written as '{name}'",
                previous.display(),
                entry.display()
            )));
        }
    }
    Ok(())
}
