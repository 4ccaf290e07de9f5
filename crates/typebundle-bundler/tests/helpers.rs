//! Shared test utilities for typebundle-bundler tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use typebundle_bundler::{BuildPlan, BundlerConfig, NodeTarget};

/// Create a package with the given `package.json` and source files.
pub fn create_project(package_json: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("package.json"), package_json).expect("write package.json");
    for (name, contents) in files {
        write_file(dir.path(), name, contents);
    }
    dir
}

pub fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, contents).expect("write file");
}

/// Config that skips syntax lowering so tests do not depend on a `node` binary.
pub fn config(input: &str, project: &TempDir) -> BundlerConfig {
    BundlerConfig::new(input, project.path()).target(NodeTarget::EsNext)
}

pub fn plan(config: &BundlerConfig) -> BuildPlan {
    BuildPlan::assemble(config).expect("assemble plan")
}

pub fn read(project: &TempDir, name: &str) -> String {
    fs::read_to_string(project.path().join(name))
        .unwrap_or_else(|e| panic!("read {name}: {e}"))
}
