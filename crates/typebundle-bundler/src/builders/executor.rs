//! Build execution.
//!
//! Each entry is bundled independently, once per output format, with the
//! same plugin stack. Entries run concurrently with bounded parallelism and
//! results are merged back in entry order. Declarations are emitted once all
//! bundles are written, so every entry shares one declaration root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, Platform,
    RawMinifyOptions, ResolveOptions,
};
use rolldown_common::Output;
use rustc_hash::FxHashSet;

use crate::builders::plan::{BuildPlan, EntryPlan, ModuleFormat, OutputTarget};
use crate::diagnostics::{ExtractedDiagnostic, extract_from_rolldown_error};
use crate::dts;
use crate::output::{EmittedFile, write_files_to};
use crate::plugins::hashbang::apply_banner;
use crate::plugins::{ExternalPlugin, HashbangPlugin, PluginRegistry, TranspilePlugin};
use crate::{Error, Result};

const RESOLVE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".mts", ".cts", ".js", ".mjs", ".cjs", ".json",
];

/// In-memory result of bundling one entry.
#[derive(Debug, Clone, Default)]
pub struct EntryBuild {
    pub entry: PathBuf,
    /// Bundles for every output format, named relative to the output directory
    pub files: Vec<EmittedFile>,
    /// Absolute paths of the source modules that were bundled
    pub modules: Vec<PathBuf>,
}

/// Result of building and writing one entry.
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub entry: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub declarations: Vec<PathBuf>,
    pub duration: Duration,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub entries: Vec<EntryReport>,
    pub duration: Duration,
}

impl BuildReport {
    /// Every file written, bundles first.
    ///
    /// Declarations shared between entries are listed once.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        let mut seen = FxHashSet::default();
        self.entries
            .iter()
            .flat_map(|e| e.outputs.iter().chain(e.declarations.iter()))
            .map(PathBuf::as_path)
            .filter(move |path| seen.insert(*path))
    }
}

/// Bundle one entry for all of its output formats, without writing anything.
pub async fn build_entry(plan: &EntryPlan) -> Result<EntryBuild> {
    let mut build = EntryBuild {
        entry: plan.entry.clone(),
        ..Default::default()
    };

    for output in &plan.outputs {
        let (files, modules) = bundle_format(plan, output).await?;
        build.files.extend(files);
        build.modules.extend(modules);
    }

    build.modules.sort();
    build.modules.dedup();
    Ok(build)
}

async fn bundle_format(
    plan: &EntryPlan,
    output: &OutputTarget,
) -> Result<(Vec<EmittedFile>, Vec<PathBuf>)> {
    let hashbang = HashbangPlugin::new(&plan.entry);
    let banner = hashbang.banner();

    let mut registry = PluginRegistry::new();
    registry.add(ExternalPlugin::new(
        Arc::clone(&plan.policy),
        plan.entry.clone(),
        output.format,
    ));
    registry.add(hashbang);
    if let Some(target) = plan.target.oxc_target() {
        registry.add(TranspilePlugin::new(target)?);
    }

    tracing::debug!(
        entry = %plan.entry.display(),
        format = output.format.as_str(),
        plugins = ?registry.names(),
        "bundling"
    );

    let mut bundler = RolldownBundlerBuilder::default()
        .with_options(configure_rolldown_options(plan, output.format))
        .with_plugins(registry.into_rolldown_plugins())
        .build()
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let bundle = bundler
        .generate()
        .await
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    if !bundle.warnings.is_empty() {
        for warning in extract_from_rolldown_error(&bundle.warnings) {
            tracing::warn!(
                entry = %plan.entry.display(),
                location = %warning.location().unwrap_or_default(),
                "{}: {}",
                warning.kind,
                warning.message
            );
        }
    }

    let banner = banner.lock().clone();
    let mut files = Vec::with_capacity(bundle.assets.len());
    let mut modules = Vec::new();

    for item in &bundle.assets {
        match item {
            Output::Chunk(chunk) => {
                let code = apply_banner(banner.as_deref(), chunk.code.clone());
                files.push(EmittedFile::new(chunk.filename.as_str(), code));

                modules.extend(
                    chunk
                        .modules
                        .keys
                        .iter()
                        .map(|id| PathBuf::from(id.to_string()))
                        .filter(|path| path.is_absolute()),
                );
            }
            Output::Asset(asset) => {
                files.push(EmittedFile::new(
                    asset.filename.as_str(),
                    asset.source.as_bytes(),
                ));
            }
        }
    }

    Ok((files, modules))
}

/// Configure Rolldown options for one entry and format.
fn configure_rolldown_options(plan: &EntryPlan, format: ModuleFormat) -> BundlerOptions {
    let ext = format.extension();

    BundlerOptions {
        input: Some(vec![InputItem {
            name: Some(plan.name.clone()),
            import: plan.entry.to_string_lossy().into_owned(),
        }]),
        cwd: Some(plan.cwd.clone()),
        format: Some(format.to_rolldown()),
        platform: Some(Platform::Node),
        entry_filenames: Some(format!("[name]{ext}").into()),
        chunk_filenames: Some(format!("[name]-[hash]{ext}").into()),
        minify: plan.compress.then(|| RawMinifyOptions::from(true)),
        resolve: Some(configure_resolution(&plan.cwd, format)),
        ..Default::default()
    }
}

/// Node-style resolution walking `node_modules` up from `cwd`.
fn configure_resolution(cwd: &Path, format: ModuleFormat) -> ResolveOptions {
    let mut modules = Vec::new();
    let mut current = Some(cwd);
    while let Some(dir) = current {
        modules.push(dir.join("node_modules").to_string_lossy().into_owned());
        current = dir.parent();
    }
    modules.push("node_modules".to_string());

    ResolveOptions {
        main_fields: Some(format.main_fields()),
        condition_names: Some(format.condition_names()),
        extensions: Some(RESOLVE_EXTENSIONS.iter().map(|s| s.to_string()).collect()),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

/// Bundles of one entry, written to disk.
struct Bundled {
    outputs: Vec<PathBuf>,
    modules: Vec<PathBuf>,
    duration: Duration,
}

/// Build and write the bundles of one entry.
async fn bundle_entry(plan: EntryPlan) -> Result<Bundled> {
    let started = Instant::now();
    let build = build_entry(&plan).await?;
    let outputs = write_files_to(&plan.out_dir, &build.files)?;

    Ok(Bundled {
        outputs,
        modules: build.modules,
        duration: started.elapsed(),
    })
}

/// Build every entry of `plan`, returning one result per entry in plan order.
///
/// A failing entry does not stop the others. Entries whose bundles fail get
/// no declarations.
pub async fn run_each(plan: &BuildPlan) -> Vec<(PathBuf, Result<EntryReport>)> {
    let bundled = bundle_all(plan).await;

    let declaration_started = Instant::now();
    let declarations = {
        let ready: Vec<dts::EntryModules<'_>> = plan
            .entries
            .iter()
            .zip(&bundled)
            .filter_map(|(entry, result)| {
                result
                    .as_ref()
                    .ok()
                    .map(|bundled| (entry, bundled.modules.as_slice()))
            })
            .collect();
        dts::emit_declarations(&ready).await
    };
    let declaration_time = declaration_started.elapsed();
    let mut declarations = declarations.into_iter();

    plan.entries
        .iter()
        .zip(bundled)
        .map(|(entry, result)| {
            let report = result.and_then(|bundled| {
                let emitted = declarations.next().unwrap_or_else(|| Ok(Vec::new()))?;
                Ok(EntryReport {
                    entry: entry.entry.clone(),
                    outputs: bundled.outputs,
                    declarations: emitted,
                    duration: bundled.duration + declaration_time,
                })
            });
            (entry.entry.clone(), report)
        })
        .collect()
}

/// Bundle every entry concurrently, one result per entry in plan order.
async fn bundle_all(plan: &BuildPlan) -> Vec<Result<Bundled>> {
    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    let max_parallel = num_cpus::get().clamp(1, 8);
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let mut join_set = JoinSet::new();

    for (index, entry) in plan.entries.iter().enumerate() {
        let entry = entry.clone();
        let permit = Arc::clone(&semaphore);

        join_set.spawn(async move {
            let result = match permit.acquire_owned().await {
                Ok(_permit) => bundle_entry(entry).await,
                Err(e) => Err(Error::Bundler(vec![ExtractedDiagnostic::other(
                    "Scheduler",
                    format!("build queue closed: {e}"),
                )])),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<Bundled>>> =
        (0..plan.entries.len()).map(|_| None).collect();
    let mut panics = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(join_err) => panics.push(join_err.to_string()),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                let message = panics
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "no result".to_string());
                Err(Error::Bundler(vec![ExtractedDiagnostic::other(
                    "PanicDuringBuild",
                    format!("Build task panicked: {message}"),
                )]))
            })
        })
        .collect()
}

/// Build every entry of `plan`.
///
/// With a single failure the original error is returned; with several, a
/// [`Error::BuildFailed`] listing each failing entry.
pub async fn run(plan: &BuildPlan) -> Result<BuildReport> {
    let started = Instant::now();
    let results = run_each(plan).await;

    let mut entries = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (entry, result) in results {
        match result {
            Ok(report) => entries.push(report),
            Err(e) => errors.push((entry, e)),
        }
    }

    if errors.len() == 1 {
        let (entry, error) = errors.remove(0);
        tracing::debug!(entry = %entry.display(), "build failed");
        return Err(error);
    }
    if !errors.is_empty() {
        return Err(Error::BuildFailed {
            failures: errors
                .into_iter()
                .map(|(entry, e)| format!("{}: {}", relative_to(&entry, &plan.cwd), e))
                .collect(),
        });
    }

    Ok(BuildReport {
        entries,
        duration: started.elapsed(),
    })
}

fn relative_to(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
