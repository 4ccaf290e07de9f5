//! Integration tests for the build command.
//!
//! These run the command layer against real package directories. The target
//! is pinned to `esnext` so no `node` binary is needed.

use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use typebundle_cli::cli::BuildArgs;
use typebundle_cli::commands::{self, build};
use typebundle_cli::config::TypebundleConfig;
use typebundle_cli::{BuildError, CliError, ConfigError};

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("package.json"),
        r#"{"name":"demo","version":"1.0.0","dependencies":{"chalk":"^5.0.0"}}"#,
    )
    .unwrap();
    for (name, contents) in files {
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    temp
}

fn args(input: &str, cwd: &Path) -> BuildArgs {
    BuildArgs {
        input: Some(input.to_string()),
        target: Some("esnext".to_string()),
        cwd: Some(cwd.to_path_buf()),
        ..BuildArgs::default()
    }
}

#[tokio::test]
#[serial]
async fn test_build_single_entry() {
    let temp = project(&[(
        "src/index.ts",
        "import chalk from 'chalk';\nexport const greet = (name: string): string => chalk.green(name);\n",
    )]);

    commands::execute(args("src/index.ts", temp.path()))
        .await
        .unwrap();

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.contains("require(\"chalk\")") || js.contains("require('chalk')"));
    assert!(!temp.path().join("dist/index.mjs").exists());

    let dts = fs::read_to_string(temp.path().join("dist/index.d.ts")).unwrap();
    assert!(dts.contains("greet"));
}

#[tokio::test]
#[serial]
async fn test_build_esm_and_types_dir() {
    let temp = project(&[("src/index.ts", "export const answer: number = 42;\n")]);

    let args = BuildArgs {
        esm: true,
        output: Some(PathBuf::from("lib")),
        types: Some(PathBuf::from("types")),
        ..args("src/index.ts", temp.path())
    };
    commands::execute(args).await.unwrap();

    assert!(temp.path().join("lib/index.js").exists());
    assert!(temp.path().join("lib/index.mjs").exists());
    assert!(temp.path().join("types/index.d.ts").exists());
    assert!(!temp.path().join("lib/index.d.ts").exists());
}

#[tokio::test]
#[serial]
async fn test_build_no_dts() {
    let temp = project(&[("src/index.ts", "export const answer: number = 42;\n")]);

    let args = BuildArgs {
        no_dts: true,
        ..args("src/index.ts", temp.path())
    };
    commands::execute(args).await.unwrap();

    assert!(temp.path().join("dist/index.js").exists());
    assert!(!temp.path().join("dist/index.d.ts").exists());
}

#[tokio::test]
#[serial]
async fn test_build_from_config_file() {
    let temp = project(&[("src/main.ts", "export const main: () => void = () => {};\n")]);
    fs::write(
        temp.path().join("typebundle.config.json"),
        r#"{"input":"src/main.ts","output":"out","target":"esnext","dts":false}"#,
    )
    .unwrap();

    let args = BuildArgs {
        cwd: Some(temp.path().to_path_buf()),
        ..BuildArgs::default()
    };
    commands::execute(args).await.unwrap();

    assert!(temp.path().join("out/main.js").exists());
    assert!(!temp.path().join("out/main.d.ts").exists());
}

#[tokio::test]
#[serial]
async fn test_build_glob_entries() {
    let temp = project(&[
        ("src/cli.ts", "import { run } from './main';\nrun();\n"),
        ("src/main.ts", "export function run(): void {}\n"),
    ]);

    let config = TypebundleConfig::load_from(&args("src/*.ts", temp.path()), temp.path()).unwrap();
    let report = build::execute(&config, temp.path()).await.unwrap();

    assert_eq!(report.entries.len(), 2);
    let cli = fs::read_to_string(temp.path().join("dist/cli.js")).unwrap();
    assert!(cli.contains("./main.js"));
    assert!(temp.path().join("dist/main.js").exists());
}

#[tokio::test]
#[serial]
async fn test_build_missing_input() {
    let temp = project(&[]);
    let args = BuildArgs {
        cwd: Some(temp.path().to_path_buf()),
        ..BuildArgs::default()
    };

    assert!(matches!(
        commands::execute(args).await,
        Err(CliError::Config(ConfigError::MissingField { .. }))
    ));
}

#[tokio::test]
#[serial]
async fn test_build_missing_entry() {
    let temp = project(&[]);

    assert!(matches!(
        commands::execute(args("src/nope.ts", temp.path())).await,
        Err(CliError::Bundler(
            typebundle_bundler::Error::EntryNotFound { .. }
        ))
    ));
}

#[tokio::test]
#[serial]
async fn test_build_output_is_file() {
    let temp = project(&[
        ("src/index.ts", "export const a: number = 1;\n"),
        ("dist", "occupied"),
    ]);

    assert!(matches!(
        commands::execute(args("src/index.ts", temp.path())).await,
        Err(CliError::Build(BuildError::NotADirectory(_)))
    ));
}
