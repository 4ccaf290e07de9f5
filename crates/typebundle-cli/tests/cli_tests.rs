//! Tests that run the `typebundle` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn typebundle() -> Command {
    let mut cmd = Command::cargo_bin("typebundle").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("package.json"), r#"{"name":"demo"}"#).unwrap();
    fs::create_dir(temp.path().join("src")).unwrap();
    fs::write(
        temp.path().join("src/index.ts"),
        "#!/usr/bin/env node\nexport const version: string = '1.0.0';\n",
    )
    .unwrap();
    temp
}

#[test]
fn test_help() {
    typebundle()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dts-backend"))
        .stdout(predicate::str::contains("--esm"));
}

#[test]
fn test_missing_input() {
    let temp = TempDir::new().unwrap();
    typebundle()
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("input"));
}

#[test]
fn test_invalid_target() {
    typebundle()
        .args(["src/index.ts", "--target", "latest"])
        .assert()
        .failure();
}

#[test]
fn test_no_dts_conflicts_with_backend() {
    typebundle()
        .args(["src/index.ts", "--no-dts", "--dts-backend", "tsc"])
        .assert()
        .failure();
}

#[test]
fn test_successful_build() {
    let temp = project();

    typebundle()
        .current_dir(temp.path())
        .args(["src/index.ts", "--target", "esnext", "--esm"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Successful build. (src/index.ts)"));

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.starts_with("#!/usr/bin/env node\n"));
    assert!(temp.path().join("dist/index.mjs").exists());
    assert!(temp.path().join("dist/index.d.ts").exists());
}

#[test]
fn test_build_with_cwd_flag() {
    let temp = project();

    typebundle()
        .args(["src/index.ts", "--target", "esnext", "--no-dts", "--cwd"])
        .arg(temp.path())
        .assert()
        .success();

    assert!(temp.path().join("dist/index.js").exists());
    assert!(!temp.path().join("dist/index.d.ts").exists());
}

#[test]
fn test_config_file() {
    let temp = project();
    fs::write(
        temp.path().join("typebundle.config.json"),
        r#"{"input":"src/index.ts","output":"build","target":"esnext"}"#,
    )
    .unwrap();

    typebundle().current_dir(temp.path()).assert().success();
    assert!(temp.path().join("build/index.js").exists());
}

#[test]
fn test_env_override() {
    let temp = project();

    typebundle()
        .current_dir(temp.path())
        .env("TYPEBUNDLE_OUTPUT", "from-env")
        .args(["src/index.ts", "--target", "esnext"])
        .assert()
        .success();
    assert!(temp.path().join("from-env/index.js").exists());
}

#[test]
fn test_env_numeric_target() {
    let temp = project();

    typebundle()
        .current_dir(temp.path())
        .env("TYPEBUNDLE_TARGET", "18")
        .args(["src/index.ts", "--no-dts"])
        .assert()
        .success();
    assert!(temp.path().join("dist/index.js").exists());
}

#[test]
fn test_quiet_prints_only_errors() {
    let temp = project();

    typebundle()
        .current_dir(temp.path())
        .args(["src/index.ts", "--target", "esnext", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    assert!(temp.path().join("dist/index.js").exists());

    typebundle()
        .current_dir(temp.path())
        .args(["src/missing.ts", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.ts"));
}

#[test]
fn test_missing_package_json() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.ts"), "export {};\n").unwrap();

    typebundle()
        .current_dir(temp.path())
        .args(["index.ts", "--target", "esnext"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("package.json"));
}
