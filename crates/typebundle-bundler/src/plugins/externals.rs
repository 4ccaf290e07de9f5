//! External-module policy.
//!
//! Decides which import specifiers stay as imports in the output instead of
//! being inlined:
//!
//! - Node.js built-ins
//! - anything matching `^(dep1|dep2|...)($|/)` built from `dependencies` and
//!   `peerDependencies`
//! - in multi-entry runs, the bare `.` specifier (rewritten to the package's
//!   own index) and relative imports of sibling entries (rewritten to that
//!   entry's output file)

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use regex::Regex;
use rolldown_common::ResolvedExternal;
use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use rustc_hash::FxHashSet;

use crate::builders::ModuleFormat;
use crate::entries::entry_name;
use crate::package::PackageJson;
use crate::plugins::registry::{PhasedPlugin, PluginPhase};
use crate::target::is_node_builtin;
use crate::{Error, Result};

/// Extensions probed when a relative import omits one.
const PROBE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts", ".js", ".mjs", ".cjs"];

/// Outcome of classifying one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Leave the import in place, under this specifier
    External(String),
    /// Inline the module
    Bundle,
}

/// External-module policy shared by every entry of a run.
#[derive(Debug)]
pub struct ExternalPolicy {
    dependencies: Option<Regex>,
    multi_entry: bool,
    entries: FxHashSet<PathBuf>,
    local_index_cjs: Option<String>,
    local_index_esm: Option<String>,
}

impl ExternalPolicy {
    /// Derive the policy from package metadata and the resolved entry list.
    pub fn new(package: &PackageJson, entries: &[PathBuf]) -> Result<Self> {
        let names = package.external_dependencies();
        let dependencies = if names.is_empty() {
            None
        } else {
            let alternatives = names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!("^({alternatives})($|/)");
            Some(Regex::new(&pattern).map_err(|e| {
                Error::InvalidConfig(format!("Cannot build external pattern: {e}"))
            })?)
        };

        Ok(Self {
            dependencies,
            multi_entry: entries.len() > 1,
            entries: entries.iter().map(|e| e.clean()).collect(),
            local_index_cjs: package.local_index_for(ModuleFormat::Cjs),
            local_index_esm: package.local_index_for(ModuleFormat::Esm),
        })
    }

    /// The dependency regex, if the package declares any dependencies.
    pub fn dependency_pattern(&self) -> Option<&str> {
        self.dependencies.as_ref().map(Regex::as_str)
    }

    pub fn is_multi_entry(&self) -> bool {
        self.multi_entry
    }

    /// Classify `specifier` imported from `importer` while building `entry`.
    pub fn classify(
        &self,
        specifier: &str,
        importer: Option<&Path>,
        entry: &Path,
        format: ModuleFormat,
    ) -> Resolution {
        if is_node_builtin(specifier) {
            return Resolution::External(specifier.to_string());
        }

        if self
            .dependencies
            .as_ref()
            .is_some_and(|re| re.is_match(specifier))
        {
            return Resolution::External(specifier.to_string());
        }

        if !self.multi_entry {
            return Resolution::Bundle;
        }

        if specifier == "." {
            let local = match format {
                ModuleFormat::Cjs => self.local_index_cjs.as_deref(),
                ModuleFormat::Esm => self.local_index_esm.as_deref(),
            };
            return Resolution::External(local.unwrap_or(".").to_string());
        }

        let Some(importer) = importer else {
            return Resolution::Bundle;
        };
        if !(specifier.starts_with("./") || specifier.starts_with("../")) {
            return Resolution::Bundle;
        }

        let Some(dir) = importer.parent() else {
            return Resolution::Bundle;
        };
        let base = dir.join(specifier).clean();

        match self.sibling_entry(&base) {
            Some(sibling) if sibling != entry => Resolution::External(format!(
                "./{}{}",
                entry_name(sibling),
                format.extension()
            )),
            _ => Resolution::Bundle,
        }
    }

    /// Find the entry file `base` refers to, probing extensions and `index` files.
    fn sibling_entry(&self, base: &Path) -> Option<&PathBuf> {
        if let Some(found) = self.entries.get(base) {
            return Some(found);
        }

        // `./cli.js` written against a `cli.ts` source
        if let Some(ext) = base.extension().and_then(|e| e.to_str()) {
            let ts_ext = match ext {
                "js" => Some(["ts", "tsx"].as_slice()),
                "mjs" => Some(["mts"].as_slice()),
                "cjs" => Some(["cts"].as_slice()),
                _ => None,
            };
            for candidate in ts_ext.into_iter().flatten() {
                if let Some(found) = self.entries.get(&base.with_extension(candidate)) {
                    return Some(found);
                }
            }
        }

        for ext in PROBE_EXTENSIONS {
            let mut with_ext = base.as_os_str().to_owned();
            with_ext.push(ext);
            if let Some(found) = self.entries.get(Path::new(&with_ext)) {
                return Some(found);
            }

            if let Some(found) = self.entries.get(&base.join(format!("index{ext}"))) {
                return Some(found);
            }
        }

        None
    }
}

/// Rolldown plugin applying an [`ExternalPolicy`] for one entry and format.
#[derive(Debug, Clone)]
pub struct ExternalPlugin {
    policy: Arc<ExternalPolicy>,
    entry: PathBuf,
    format: ModuleFormat,
}

impl ExternalPlugin {
    pub fn new(policy: Arc<ExternalPolicy>, entry: PathBuf, format: ModuleFormat) -> Self {
        Self {
            policy,
            entry,
            format,
        }
    }
}

impl Plugin for ExternalPlugin {
    fn name(&self) -> Cow<'static, str> {
        "typebundle:externals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs<'_>,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        // Entries themselves are never external
        let resolution = match args.importer {
            None => Resolution::Bundle,
            Some(importer) => self.policy.classify(
                args.specifier,
                Some(Path::new(importer)),
                &self.entry,
                self.format,
            ),
        };

        async move {
            match resolution {
                Resolution::External(id) => {
                    tracing::trace!(id = %id, "marking import external");
                    Ok(Some(HookResolveIdOutput {
                        id: id.into(),
                        external: Some(ResolvedExternal::Bool(true)),
                        ..Default::default()
                    }))
                }
                Resolution::Bundle => Ok(None),
            }
        }
    }
}

impl PhasedPlugin for ExternalPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}
