//! TypeScript declaration (`.d.ts`) generation.
//!
//! Declarations are emitted once per run, after every entry has been bundled,
//! so all entries share one declaration root:
//!
//! - [`DeclarationBackend::Isolated`] runs OXC isolated declarations over the
//!   first-party TypeScript modules of every bundle. Each module lands at
//!   `<types>/<path relative to the root>`, where the root is the deepest
//!   directory containing all of them (what `tsc` calls `rootDir`).
//! - [`DeclarationBackend::Tsc`] runs the TypeScript compiler once over all
//!   TypeScript entries and reports the files it emitted.
//!
//! When an entry's declarations do not end up at `<types>/<name>.d.ts`, a
//! re-export stub is written there.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType as OxcSourceType;
use path_clean::PathClean;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::builders::EntryPlan;
use crate::output::{EmittedFile, write_files_to};
use crate::{Error, Result};

/// Written in place of an empty declaration file.
pub const EMPTY_DECLARATIONS: &str = "export {};\n";

/// An entry together with the source modules bundled into it.
pub type EntryModules<'a> = (&'a EntryPlan, &'a [PathBuf]);

/// How declarations are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationBackend {
    /// OXC isolated declarations, in process
    #[default]
    Isolated,
    /// The `tsc` binary
    Tsc,
}

impl DeclarationBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isolated => "isolated",
            Self::Tsc => "tsc",
        }
    }
}

impl FromStr for DeclarationBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "isolated" | "oxc" => Ok(Self::Isolated),
            "tsc" => Ok(Self::Tsc),
            other => Err(Error::InvalidConfig(format!(
                "Invalid declaration backend: '{other}'. Expected: isolated, tsc"
            ))),
        }
    }
}

impl fmt::Display for DeclarationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a module path is a TypeScript source file
pub fn is_typescript_module(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts") {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "ts" | "tsx" | "mts" | "cts"))
}

fn in_node_modules(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(n) if n == "node_modules"))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Generate `.d.ts` content from TypeScript source using OXC.
///
/// Empty output is replaced with [`EMPTY_DECLARATIONS`] so the file is still
/// a valid module.
pub fn generate_declarations(source: &str, file_path: &Path) -> anyhow::Result<String> {
    let allocator = Allocator::default();

    let source_type = OxcSourceType::from_path(file_path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid TypeScript file: {}", file_path.display()))?;

    let parse_result = Parser::new(&allocator, source, source_type).parse();
    if !parse_result.errors.is_empty() {
        let messages: Vec<String> = parse_result.errors.iter().map(|e| e.to_string()).collect();
        bail!("Failed to parse: {}", messages.join(", "));
    }

    let options = IsolatedDeclarationsOptions {
        strip_internal: false,
    };
    let dts_result = IsolatedDeclarations::new(&allocator, options).build(&parse_result.program);
    if !dts_result.errors.is_empty() {
        let messages: Vec<String> = dts_result.errors.iter().map(|e| e.to_string()).collect();
        bail!("{}", messages.join(", "));
    }

    let code = Codegen::new().build(&dts_result.program).code;
    if code.trim().is_empty() {
        Ok(EMPTY_DECLARATIONS.to_string())
    } else {
        Ok(code)
    }
}

/// Deepest directory containing every module in `modules`.
pub fn declaration_root<'a>(modules: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut root: Option<PathBuf> = None;
    for module in modules {
        let dir = module.parent()?;
        root = Some(match root {
            None => dir.to_path_buf(),
            Some(current) => current
                .components()
                .zip(dir.components())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a)
                .collect(),
        });
    }
    root
}

/// Declaration file name for `module`, relative to the types directory.
///
/// Returns `None` for modules outside `root`, inside `node_modules`, or that
/// are not TypeScript sources.
pub fn declaration_path(module: &Path, root: &Path) -> Option<String> {
    if !is_typescript_module(module) {
        return None;
    }
    let relative = module.strip_prefix(root).ok()?;
    if in_node_modules(relative) {
        return None;
    }

    let dts_ext = match relative.extension()?.to_str()? {
        "mts" => "d.mts",
        "cts" => "d.cts",
        _ => "d.ts",
    };
    Some(to_slash(&relative.with_extension(dts_ext)))
}

/// Import specifier of a declaration file, relative to the types directory.
fn declaration_specifier(file_name: &str) -> String {
    let module = if let Some(stem) = file_name.strip_suffix(".d.mts") {
        format!("{stem}.mjs")
    } else if let Some(stem) = file_name.strip_suffix(".d.cts") {
        format!("{stem}.cjs")
    } else {
        file_name
            .strip_suffix(".d.ts")
            .unwrap_or(file_name)
            .to_string()
    };
    format!("./{module}")
}

fn has_default_export(declarations: &str) -> bool {
    declarations.contains("export default") || declarations.contains("as default")
}

/// `<name>.d.ts` content forwarding to the declarations at `target`.
pub fn reexport_stub(target: &str, has_default: bool) -> String {
    let specifier = declaration_specifier(target);
    let mut stub = format!("export * from '{specifier}';\n");
    if has_default {
        stub.push_str(&format!("export {{ default }} from '{specifier}';\n"));
    }
    stub
}

/// Where a declaration file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Module(PathBuf),
    Stub(PathBuf),
}

impl Origin {
    fn path(&self) -> &Path {
        match self {
            Origin::Module(path) | Origin::Stub(path) => path,
        }
    }
}

/// Tracks which source claimed each declaration file name.
#[derive(Default)]
struct Claims {
    owners: FxHashMap<String, Origin>,
    conflicts: BTreeMap<String, String>,
}

impl Claims {
    fn claim(&mut self, file_name: &str, origin: &Origin) {
        match self.owners.get(file_name) {
            Some(owner) if owner != origin => {
                self.conflicts
                    .entry(file_name.to_string())
                    .or_insert_with(|| {
                        format!(
                            "Declarations for '{}' and '{}' would both be written to '{file_name}'",
                            owner.path().display(),
                            origin.path().display()
                        )
                    });
            }
            Some(_) => {}
            None => {
                self.owners.insert(file_name.to_string(), origin.clone());
            }
        }
    }

    /// First conflict among `files`, if any.
    fn conflict_for<'a>(&self, mut files: impl Iterator<Item = &'a str>) -> Option<String> {
        files.find_map(|name| self.conflicts.get(name).cloned())
    }
}

/// Generate isolated declarations for every entry, one result per entry.
///
/// Only modules inside the package root and outside `node_modules` count as
/// first-party. Modules shared by several entries are generated once. A
/// declaration file name claimed by two different sources fails every entry
/// involved.
pub fn collect_isolated(entries: &[EntryModules<'_>]) -> Vec<Result<Vec<EmittedFile>>> {
    let module_sets: Vec<Option<Vec<&Path>>> = entries
        .iter()
        .map(|(plan, modules)| {
            if !is_typescript_module(&plan.entry) {
                tracing::debug!(entry = %plan.entry.display(), "skipping declarations for JavaScript entry");
                return None;
            }
            let mut set: Vec<&Path> = modules
                .iter()
                .map(PathBuf::as_path)
                .filter(|m| {
                    is_typescript_module(m)
                        && m.strip_prefix(&plan.cwd)
                            .is_ok_and(|relative| !in_node_modules(relative))
                })
                .collect();
            set.push(&plan.entry);
            set.sort();
            set.dedup();
            Some(set)
        })
        .collect();

    let Some(root) = declaration_root(module_sets.iter().flatten().flatten().copied()) else {
        return entries.iter().map(|_| Ok(Vec::new())).collect();
    };
    tracing::debug!(root = %root.display(), "declaration root");

    let mut generated: FxHashMap<&Path, std::result::Result<String, String>> =
        FxHashMap::default();
    let mut claims = Claims::default();
    let mut planned: Vec<Result<Vec<(Origin, EmittedFile)>>> = Vec::with_capacity(entries.len());

    for ((plan, _), set) in entries.iter().zip(&module_sets) {
        let Some(set) = set else {
            planned.push(Ok(Vec::new()));
            continue;
        };

        let mut files = Vec::with_capacity(set.len() + 1);
        let mut failure = None;
        let mut entry_file = None;
        for &module in set {
            let Some(file_name) = declaration_path(module, &root) else {
                continue;
            };
            let contents = generated.entry(module).or_insert_with(|| {
                std::fs::read_to_string(module)
                    .map_err(|e| e.to_string())
                    .and_then(|source| {
                        generate_declarations(&source, module).map_err(|e| e.to_string())
                    })
            });
            match contents {
                Ok(contents) => {
                    if module == plan.entry.as_path() {
                        entry_file = Some((file_name.clone(), has_default_export(contents)));
                    }
                    files.push((
                        Origin::Module(module.to_path_buf()),
                        EmittedFile::new(file_name, contents.clone()),
                    ));
                }
                Err(message) => {
                    failure.get_or_insert_with(|| Error::Declarations {
                        file: module.display().to_string(),
                        message: message.clone(),
                    });
                }
            }
        }

        if let Some(err) = failure {
            planned.push(Err(err));
            continue;
        }

        let stub_name = format!("{}.d.ts", plan.name);
        if let Some((own, has_default)) = entry_file {
            if own != stub_name {
                files.push((
                    Origin::Stub(plan.entry.clone()),
                    EmittedFile::new(stub_name, reexport_stub(&own, has_default)),
                ));
            }
        }

        for (origin, file) in &files {
            claims.claim(&file.file_name, origin);
        }
        planned.push(Ok(files));
    }

    planned
        .into_iter()
        .map(|result| {
            let files = result?;
            if let Some(message) = claims.conflict_for(files.iter().map(|(_, f)| f.file_name.as_str())) {
                return Err(Error::InvalidConfig(message));
            }
            Ok(files.into_iter().map(|(_, file)| file).collect())
        })
        .collect()
}

/// Emit declarations for every bundled entry, one result per entry in order.
///
/// All entries of a plan share the declaration backend and types directory.
pub async fn emit_declarations(entries: &[EntryModules<'_>]) -> Vec<Result<Vec<PathBuf>>> {
    let mut results: Vec<Option<Result<Vec<PathBuf>>>> = entries.iter().map(|_| None).collect();

    for backend in [DeclarationBackend::Isolated, DeclarationBackend::Tsc] {
        let (indices, group): (Vec<usize>, Vec<EntryModules<'_>>) = entries
            .iter()
            .enumerate()
            .filter(|(_, (plan, _))| plan.declarations == Some(backend))
            .map(|(index, entry)| (index, *entry))
            .unzip();
        if group.is_empty() {
            continue;
        }

        let emitted = match backend {
            DeclarationBackend::Isolated => emit_isolated(&group),
            DeclarationBackend::Tsc => emit_with_tsc(&group).await,
        };
        for (index, result) in indices.into_iter().zip(emitted) {
            results[index] = Some(result);
        }
    }

    results
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Ok(Vec::new())))
        .collect()
}

fn emit_isolated(entries: &[EntryModules<'_>]) -> Vec<Result<Vec<PathBuf>>> {
    let planned = collect_isolated(entries);
    let Some((first, _)) = entries.first() else {
        return Vec::new();
    };
    let types_dir = &first.types_dir;

    let mut unique: BTreeMap<&str, &EmittedFile> = BTreeMap::new();
    for file in planned.iter().flatten().flatten() {
        unique.entry(file.file_name.as_str()).or_insert(file);
    }
    let to_write: Vec<EmittedFile> = unique.into_values().cloned().collect();

    let write_error = if to_write.is_empty() {
        None
    } else {
        write_files_to(types_dir, &to_write).err().map(|e| e.to_string())
    };

    planned
        .into_iter()
        .map(|result| {
            let files = result?;
            match &write_error {
                Some(message) if !files.is_empty() => Err(Error::WriteFailure(message.clone())),
                _ => Ok(files
                    .iter()
                    .map(|file| types_dir.join(&file.file_name).clean())
                    .collect()),
            }
        })
        .collect()
}

/// Prefer the project's own compiler over one on `PATH`.
pub fn find_tsc(cwd: &Path) -> PathBuf {
    let bin = if cfg!(windows) { "tsc.cmd" } else { "tsc" };
    let mut dir = Some(cwd);
    while let Some(current) = dir {
        let candidate = current.join("node_modules").join(".bin").join(bin);
        if candidate.is_file() {
            return candidate;
        }
        dir = current.parent();
    }
    PathBuf::from(bin)
}

/// Failed `tsc` run, reported for every entry it covered.
#[derive(Debug, Clone)]
struct TscFailure {
    status: String,
    output: String,
}

impl TscFailure {
    fn to_error(&self) -> Error {
        Error::TypeChecker {
            status: self.status.clone(),
            output: self.output.clone(),
        }
    }
}

async fn emit_with_tsc(entries: &[EntryModules<'_>]) -> Vec<Result<Vec<PathBuf>>> {
    let Some((first, _)) = entries.first() else {
        return Vec::new();
    };
    let typescript: Vec<&Path> = entries
        .iter()
        .map(|(plan, _)| plan.entry.as_path())
        .filter(|entry| is_typescript_module(entry))
        .collect();
    if typescript.is_empty() {
        return entries.iter().map(|_| Ok(Vec::new())).collect();
    }

    let emitted = match run_tsc(&first.cwd, &first.types_dir, &typescript).await {
        Ok(emitted) => emitted,
        Err(failure) => {
            return entries
                .iter()
                .map(|(plan, _)| {
                    if is_typescript_module(&plan.entry) {
                        Err(failure.to_error())
                    } else {
                        Ok(Vec::new())
                    }
                })
                .collect();
        }
    };

    attribute_tsc_output(entries, &first.types_dir, emitted)
}

/// Assign emitted files to entries and write stubs where needed.
///
/// Each entry reports its own declarations and stub. Files tsc emitted for
/// shared modules are reported with the first TypeScript entry.
fn attribute_tsc_output(
    entries: &[EntryModules<'_>],
    types_dir: &Path,
    emitted: Vec<PathBuf>,
) -> Vec<Result<Vec<PathBuf>>> {
    let emitted_set: FxHashSet<&Path> = emitted.iter().map(PathBuf::as_path).collect();
    let mut claimed: FxHashSet<PathBuf> = FxHashSet::default();
    let mut results = Vec::with_capacity(entries.len());
    let mut first_typescript = None;

    for (index, (plan, _)) in entries.iter().enumerate() {
        if !is_typescript_module(&plan.entry) {
            results.push(Ok(Vec::new()));
            continue;
        }
        first_typescript.get_or_insert(index);

        let Some(own) = entry_declaration(&plan.entry, types_dir, &emitted) else {
            tracing::warn!(entry = %plan.entry.display(), "tsc emitted no declarations for entry");
            results.push(Ok(Vec::new()));
            continue;
        };
        claimed.insert(own.clone());
        let mut files = vec![own.clone()];

        let stub_path = types_dir.join(format!("{}.d.ts", plan.name));
        if stub_path != own {
            if emitted_set.contains(stub_path.as_path()) {
                results.push(Err(Error::InvalidConfig(format!(
                    "Declarations for '{}' would overwrite '{}' emitted by tsc",
                    plan.entry.display(),
                    stub_path.display()
                ))));
                continue;
            }
            let relative = own.strip_prefix(types_dir).map(to_slash).unwrap_or_default();
            let has_default = std::fs::read_to_string(&own)
                .map(|text| has_default_export(&text))
                .unwrap_or(false);
            let stub = EmittedFile::new(
                format!("{}.d.ts", plan.name),
                reexport_stub(&relative, has_default),
            );
            match write_files_to(types_dir, std::slice::from_ref(&stub)) {
                Ok(written) => files.extend(written),
                Err(e) => {
                    results.push(Err(e));
                    continue;
                }
            }
        }
        results.push(Ok(files));
    }

    if let Some(index) = first_typescript {
        let leftovers: Vec<PathBuf> = emitted
            .iter()
            .filter(|path| !claimed.contains(*path))
            .cloned()
            .collect();
        if let Some(Ok(files)) = results.get_mut(index) {
            files.extend(leftovers);
        }
    }

    results
}

/// The emitted declaration file whose path mirrors the tail of `entry`.
fn entry_declaration(entry: &Path, types_dir: &Path, emitted: &[PathBuf]) -> Option<PathBuf> {
    let source_stem = entry.with_extension("");
    emitted
        .iter()
        .filter_map(|file| {
            let relative = to_slash(file.strip_prefix(types_dir).ok()?);
            let stem = relative
                .strip_suffix(".d.ts")
                .or_else(|| relative.strip_suffix(".d.mts"))
                .or_else(|| relative.strip_suffix(".d.cts"))?
                .to_string();
            let depth = Path::new(&stem).components().count();
            source_stem
                .ends_with(Path::new(&stem))
                .then_some((depth, file))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, file)| file.clone())
}

/// Declaration files listed by `--listEmittedFiles`.
fn parse_emitted_files(stdout: &str, cwd: &Path) -> Vec<PathBuf> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix("TSFILE:"))
        .map(|path| {
            let path = Path::new(path.trim());
            if path.is_absolute() {
                path.clean()
            } else {
                cwd.join(path).clean()
            }
        })
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".d.ts") || n.ends_with(".d.mts") || n.ends_with(".d.cts"))
        })
        .collect()
}

async fn run_tsc(
    cwd: &Path,
    types_dir: &Path,
    entries: &[&Path],
) -> std::result::Result<Vec<PathBuf>, TscFailure> {
    let tsc = find_tsc(cwd);
    tracing::debug!(tsc = %tsc.display(), entries = entries.len(), "running type checker");

    let output = Command::new(&tsc)
        .args([
            "--declaration",
            "--emitDeclarationOnly",
            "--skipLibCheck",
            "--listEmittedFiles",
            "--outDir",
        ])
        .arg(types_dir)
        .args(entries)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| TscFailure {
            status: format!("could not start {}", tsc.display()),
            output: format!("{e}. Install typescript or use the isolated backend."),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let mut text = stdout.into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(TscFailure {
            status: output.status.to_string(),
            output: text.trim().to_string(),
        });
    }

    let emitted = parse_emitted_files(&stdout, cwd);
    tracing::debug!(files = emitted.len(), "tsc emitted declarations");
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_typescript_module() {
        assert!(is_typescript_module(Path::new("index.ts")));
        assert!(is_typescript_module(Path::new("component.tsx")));
        assert!(is_typescript_module(Path::new("module.mts")));
        assert!(is_typescript_module(Path::new("types.cts")));
        assert!(!is_typescript_module(Path::new("index.js")));
        assert!(!is_typescript_module(Path::new("globals.d.ts")));
        assert!(!is_typescript_module(Path::new("style.css")));
    }

    #[test]
    fn test_declaration_path() {
        let root = Path::new("/pkg/src");
        assert_eq!(
            declaration_path(Path::new("/pkg/src/cli.ts"), root).as_deref(),
            Some("cli.d.ts")
        );
        assert_eq!(
            declaration_path(Path::new("/pkg/src/lib/args.ts"), root).as_deref(),
            Some("lib/args.d.ts")
        );
        assert_eq!(
            declaration_path(Path::new("/pkg/src/esm.mts"), root).as_deref(),
            Some("esm.d.mts")
        );
        assert_eq!(declaration_path(Path::new("/pkg/other/x.ts"), root), None);
        assert_eq!(
            declaration_path(Path::new("/pkg/src/node_modules/dep/index.ts"), root),
            None
        );
        assert_eq!(declaration_path(Path::new("/pkg/src/util.js"), root), None);
    }

    #[test]
    fn test_declaration_root() {
        let modules = [
            Path::new("/pkg/src/cli/index.ts"),
            Path::new("/pkg/src/shared/util.ts"),
            Path::new("/pkg/src/cli/args/parse.ts"),
        ];
        assert_eq!(
            declaration_root(modules.iter().copied()),
            Some(PathBuf::from("/pkg/src"))
        );
        assert_eq!(
            declaration_root([Path::new("/pkg/src/index.ts")]),
            Some(PathBuf::from("/pkg/src"))
        );
        assert_eq!(declaration_root(std::iter::empty()), None);
    }

    #[test]
    fn test_reexport_stub() {
        assert_eq!(
            reexport_stub("cli/index.d.ts", false),
            "export * from './cli/index';\n"
        );
        assert_eq!(
            reexport_stub("esm.d.mts", true),
            "export * from './esm.mjs';\nexport { default } from './esm.mjs';\n"
        );
    }

    #[test]
    fn test_generate_declarations_basic() {
        let source = r#"
export function greet(name: string): string {
    return `Hello, ${name}!`;
}
"#;
        let dts = generate_declarations(source, Path::new("test.ts")).unwrap();
        assert!(dts.contains("export"));
        assert!(dts.contains("function greet"));
        assert!(dts.contains("string"));
        assert!(!dts.contains("Hello"));
    }

    #[test]
    fn test_generate_declarations_empty_module() {
        let dts = generate_declarations("const hidden = 1;\n", Path::new("side.ts")).unwrap();
        assert_eq!(dts, EMPTY_DECLARATIONS);
    }

    #[test]
    fn test_generate_declarations_requires_annotations() {
        let err = generate_declarations(
            "export function f(x) { return x; }",
            Path::new("f.ts"),
        )
        .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    fn entry_plan(entry: &Path, name: &str, types_dir: &Path) -> EntryPlan {
        let cwd = types_dir.parent().unwrap().to_path_buf();
        if !cwd.join("package.json").exists() {
            std::fs::write(cwd.join("package.json"), r#"{"name":"fixture"}"#).unwrap();
        }
        let config = crate::BundlerConfig::new(entry.to_string_lossy(), &cwd);
        let mut plan = crate::BuildPlan::assemble(&config).unwrap().entries.remove(0);
        plan.name = name.to_string();
        plan.types_dir = types_dir.to_path_buf();
        plan
    }

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn names(files: &[EmittedFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn test_collect_isolated() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let entry = src.join("index.ts");
        let helper = src.join("lib/math.ts");
        write(
            &entry,
            "export { add } from './lib/math';\nexport const name: string = 'x';\n",
        );
        write(
            &helper,
            "export function add(a: number, b: number): number { return a + b; }\n",
        );

        let plan = entry_plan(&entry, "main", &dir.path().join("types"));
        let modules = vec![helper.clone(), entry.clone()];
        let mut results = collect_isolated(&[(&plan, modules.as_slice())]);
        let files = results.remove(0).unwrap();
        assert_eq!(names(&files), vec!["index.d.ts", "lib/math.d.ts", "main.d.ts"]);
        assert!(files[1].text().contains("add"));
        assert_eq!(files[2].text(), "export * from './index';\n");
    }

    #[test]
    fn test_collect_isolated_includes_modules_outside_entry_dir() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let entry = src.join("cli/index.ts");
        let shared = src.join("shared/util.ts");
        write(
            &entry,
            "export { shout } from '../shared/util';\nexport default function run(): void {}\n",
        );
        write(
            &shared,
            "export function shout(s: string): string { return s.toUpperCase(); }\n",
        );

        let plan = entry_plan(&entry, "index", &dir.path().join("types"));
        let modules = vec![entry.clone(), shared.clone()];
        let files = collect_isolated(&[(&plan, modules.as_slice())])
            .remove(0)
            .unwrap();
        assert_eq!(
            names(&files),
            vec!["cli/index.d.ts", "shared/util.d.ts", "index.d.ts"]
        );
        assert!(files[1].text().contains("shout"));
        let stub = files[2].text();
        assert!(stub.contains("export * from './cli/index';"));
        assert!(stub.contains("export { default } from './cli/index';"));
    }

    #[test]
    fn test_collect_isolated_keeps_same_named_modules_apart() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let index = src.join("index.ts");
        let index_util = src.join("util.ts");
        let run = src.join("commands/run.ts");
        let run_util = src.join("commands/util.ts");
        write(&index, "export { a } from './util';\n");
        write(&index_util, "export const a: number = 1;\n");
        write(&run, "export { b } from './util';\n");
        write(&run_util, "export const b: number = 2;\n");

        let types = dir.path().join("types");
        let index_plan = entry_plan(&index, "index", &types);
        let run_plan = entry_plan(&run, "run", &types);
        let index_modules = vec![index.clone(), index_util.clone()];
        let run_modules = vec![run.clone(), run_util.clone()];
        let results = collect_isolated(&[
            (&index_plan, index_modules.as_slice()),
            (&run_plan, run_modules.as_slice()),
        ]);

        let index_files = results[0].as_ref().unwrap();
        let run_files = results[1].as_ref().unwrap();
        assert_eq!(names(index_files), vec!["index.d.ts", "util.d.ts"]);
        assert_eq!(
            names(run_files),
            vec!["commands/run.d.ts", "commands/util.d.ts", "run.d.ts"]
        );
        assert!(run_files[1].text().contains("b"));
        assert!(!run_files[1].text().contains("const a"));
    }

    #[test]
    fn test_collect_isolated_rejects_colliding_declarations() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let index = src.join("index.ts");
        let nested = src.join("nested/run.ts");
        write(&index, "export const a: number = 1;\n");
        write(&nested, "export const b: number = 2;\n");

        // The nested entry's stub would land on the first entry's declarations.
        let types = dir.path().join("types");
        let index_plan = entry_plan(&index, "index", &types);
        let nested_plan = entry_plan(&nested, "index", &types);
        let index_modules = vec![index.clone()];
        let nested_modules = vec![nested.clone()];
        let results = collect_isolated(&[
            (&index_plan, index_modules.as_slice()),
            (&nested_plan, nested_modules.as_slice()),
        ]);

        for result in &results {
            let err = result.as_ref().unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)));
            assert!(err.to_string().contains("index.d.ts"));
        }
    }

    #[test]
    fn test_collect_isolated_reports_failing_module() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("src/index.ts");
        write(&entry, "export function f(x) { return x; }\n");

        let plan = entry_plan(&entry, "index", &dir.path().join("types"));
        let modules = vec![entry.clone()];
        let err = collect_isolated(&[(&plan, modules.as_slice())])
            .remove(0)
            .unwrap_err();
        assert!(matches!(err, Error::Declarations { ref file, .. } if file.ends_with("index.ts")));
    }

    #[test]
    fn test_collect_isolated_skips_javascript_entries() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("src/index.js");
        write(&entry, "export const a = 1;\n");

        let plan = entry_plan(&entry, "index", &dir.path().join("types"));
        let results = collect_isolated(&[(&plan, &[][..])]);
        assert!(results[0].as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_emit_declarations_writes_shared_modules_once() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let a = src.join("a.ts");
        let b = src.join("b.ts");
        let shared = src.join("shared.ts");
        write(&a, "export { s } from './shared';\n");
        write(&b, "export { s } from './shared';\n");
        write(&shared, "export const s: string = 's';\n");

        let types = dir.path().join("types");
        let a_plan = entry_plan(&a, "a", &types);
        let b_plan = entry_plan(&b, "b", &types);
        let a_modules = vec![a.clone(), shared.clone()];
        let b_modules = vec![b.clone(), shared.clone()];
        let results = emit_declarations(&[
            (&a_plan, a_modules.as_slice()),
            (&b_plan, b_modules.as_slice()),
        ])
        .await;

        let a_files = results[0].as_ref().unwrap();
        let b_files = results[1].as_ref().unwrap();
        assert!(a_files.contains(&types.join("shared.d.ts")));
        assert!(b_files.contains(&types.join("shared.d.ts")));
        assert!(types.join("a.d.ts").is_file());
        assert!(types.join("b.d.ts").is_file());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("tsc".parse::<DeclarationBackend>().unwrap(), DeclarationBackend::Tsc);
        assert_eq!(
            "Isolated".parse::<DeclarationBackend>().unwrap(),
            DeclarationBackend::Isolated
        );
        assert!("rollup".parse::<DeclarationBackend>().is_err());
        assert_eq!(DeclarationBackend::Tsc.to_string(), "tsc");
    }

    #[test]
    fn test_find_tsc_prefers_local_install() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            find_tsc(dir.path()).file_name().unwrap(),
            if cfg!(windows) { "tsc.cmd" } else { "tsc" }
        );

        let bin = dir.path().join("node_modules/.bin");
        std::fs::create_dir_all(&bin).unwrap();
        let local = bin.join(if cfg!(windows) { "tsc.cmd" } else { "tsc" });
        std::fs::write(&local, "").unwrap();
        let nested = dir.path().join("packages/app");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_tsc(&nested), local);
    }

    #[cfg(unix)]
    fn install_tsc(root: &Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let tsc = root.join("node_modules/.bin/tsc");
        write(&tsc, script);
        std::fs::set_permissions(&tsc, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tsc_failure_carries_compiler_output() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("src/index.ts");
        write(&entry, "export const a: number = 'x';\n");
        install_tsc(
            dir.path(),
            "#!/bin/sh\necho \"src/index.ts(1,14): error TS2322: Type 'string' is not assignable\"\nexit 1\n",
        );

        let mut plan = entry_plan(&entry, "index", &dir.path().join("types"));
        plan.declarations = Some(DeclarationBackend::Tsc);
        let modules = vec![entry.clone()];
        let err = emit_declarations(&[(&plan, modules.as_slice())])
            .await
            .remove(0)
            .unwrap_err();
        match err {
            Error::TypeChecker { output, .. } => assert!(output.contains("TS2322")),
            other => panic!("expected type checker error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tsc_reports_emitted_files() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("src/cli/main.ts");
        write(&entry, "export const a: number = 1;\n");
        install_tsc(
            dir.path(),
            r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--outDir" ]; then out="$2"; shift; fi
  shift
done
mkdir -p "$out/cli"
echo "export declare const a: number;" > "$out/cli/main.d.ts"
echo "export declare const b: number;" > "$out/helpers.d.ts"
echo "TSFILE: $out/cli/main.d.ts"
echo "TSFILE: $out/helpers.d.ts"
"#,
        );

        let types = dir.path().join("types");
        let mut plan = entry_plan(&entry, "main", &types);
        plan.declarations = Some(DeclarationBackend::Tsc);
        let modules = vec![entry.clone()];
        let files = emit_declarations(&[(&plan, modules.as_slice())])
            .await
            .remove(0)
            .unwrap();

        assert_eq!(
            files,
            vec![
                types.join("cli/main.d.ts"),
                types.join("main.d.ts"),
                types.join("helpers.d.ts"),
            ]
        );
        let stub = std::fs::read_to_string(types.join("main.d.ts")).unwrap();
        assert_eq!(stub, "export * from './cli/main';\n");
    }

    #[test]
    fn test_parse_emitted_files() {
        let stdout = "TSFILE: /out/types/index.d.ts\nTSFILE: types/lib/a.d.ts\nTSFILE: /out/types/index.js\nsrc/x.ts: note\n";
        assert_eq!(
            parse_emitted_files(stdout, Path::new("/out")),
            vec![
                PathBuf::from("/out/types/index.d.ts"),
                PathBuf::from("/out/types/lib/a.d.ts"),
            ]
        );
    }
}
