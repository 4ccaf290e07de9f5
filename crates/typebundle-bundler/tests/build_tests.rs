mod helpers;

use helpers::{config, create_project, plan, read, write_file};
use typebundle_bundler::{DeclarationBackend, Error, NodeTarget, build_entry, run};

const PACKAGE: &str = r#"{
    "name": "demo",
    "main": "dist/index.js",
    "module": "dist/index.mjs",
    "dependencies": { "chalk": "^5.0.0" },
    "peerDependencies": { "@scope/peer": "^1.0.0" }
}"#;

#[tokio::test]
async fn builds_commonjs_bundle() {
    let project = create_project(
        PACKAGE,
        &[
            (
                "src/index.ts",
                "import { greet } from './greet';\nexport const run = (name: string): string => greet(name);\n",
            ),
            (
                "src/greet.ts",
                "export function greet(name: string): string {\n    return `hello ${name}`;\n}\n",
            ),
        ],
    );

    let report = run(&plan(&config("src/index.ts", &project))).await.expect("build");
    assert_eq!(report.entries.len(), 1);

    let cjs = read(&project, "dist/index.js");
    assert!(cjs.contains("hello"));
    assert!(cjs.contains("exports"));
    assert!(!cjs.contains(": string"));
    assert!(!project.path().join("dist/index.mjs").exists());
}

#[tokio::test]
async fn esm_flag_adds_module_output() {
    let project = create_project(
        PACKAGE,
        &[("src/index.ts", "export const answer: number = 42;\n")],
    );

    run(&plan(&config("src/index.ts", &project).esm(true)))
        .await
        .expect("build");

    assert!(read(&project, "dist/index.js").contains("42"));
    let esm = read(&project, "dist/index.mjs");
    assert!(esm.contains("export"));
    assert!(esm.contains("42"));
}

#[tokio::test]
async fn dependencies_stay_external() {
    let project = create_project(
        PACKAGE,
        &[
            (
                "src/index.ts",
                "import chalk from 'chalk';\nimport { red } from 'chalk/colors';\nimport peer from '@scope/peer';\nimport { readFile } from 'node:fs';\nimport path from 'path';\nimport { tiny } from 'tiny';\nexport { chalk, red, peer, readFile, path, tiny };\n",
            ),
            (
                "node_modules/tiny/package.json",
                r#"{"name":"tiny","main":"index.js"}"#,
            ),
            (
                "node_modules/tiny/index.js",
                "exports.tiny = 'inlined-tiny-value';\n",
            ),
        ],
    );

    run(&plan(&config("src/index.ts", &project).declarations(None)))
        .await
        .expect("build");

    let cjs = read(&project, "dist/index.js");
    assert!(cjs.contains("require(\"chalk\")"));
    assert!(cjs.contains("require(\"chalk/colors\")"));
    assert!(cjs.contains("require(\"@scope/peer\")"));
    assert!(cjs.contains("node:fs"));
    assert!(cjs.contains("require(\"path\")"));
    assert!(cjs.contains("inlined-tiny-value"));
}

#[tokio::test]
async fn hashbang_is_kept_on_first_line() {
    let project = create_project(
        PACKAGE,
        &[(
            "src/cli.ts",
            "#!/usr/bin/env node\nconst args: string[] = process.argv.slice(2);\nconsole.log(args.length);\n",
        )],
    );

    run(&plan(&config("src/cli.ts", &project).esm(true).declarations(None)))
        .await
        .expect("build");

    for file in ["dist/cli.js", "dist/cli.mjs"] {
        let code = read(&project, file);
        assert!(code.starts_with("#!/usr/bin/env node\n"), "{file}: {code}");
        assert_eq!(code.matches("#!").count(), 1);
    }
}

#[tokio::test]
async fn writes_isolated_declarations() {
    let project = create_project(
        PACKAGE,
        &[
            (
                "src/index.ts",
                "export { add } from './math';\nexport interface Options { verbose: boolean }\n",
            ),
            (
                "src/math.ts",
                "export function add(a: number, b: number): number {\n    return a + b;\n}\n",
            ),
        ],
    );

    let report = run(&plan(&config("src/index.ts", &project).types_dir("types")))
        .await
        .expect("build");
    assert_eq!(report.entries[0].declarations.len(), 2);

    let index = read(&project, "types/index.d.ts");
    assert!(index.contains("Options"));
    assert!(index.contains("./math"));
    let math = read(&project, "types/math.d.ts");
    assert!(math.contains("add(a: number, b: number): number"));
    assert!(!project.path().join("dist/index.d.ts").exists());
}

#[tokio::test]
async fn declarations_cover_modules_above_entry_dir() {
    let project = create_project(
        PACKAGE,
        &[
            (
                "src/cli/index.ts",
                "export { shout } from '../shared/util';\nexport const version: string = '1';\n",
            ),
            (
                "src/shared/util.ts",
                "export function shout(s: string): string {\n    return s.toUpperCase();\n}\n",
            ),
        ],
    );

    let report = run(&plan(&config("src/cli/index.ts", &project).types_dir("types")))
        .await
        .expect("build");
    assert_eq!(report.entries[0].declarations.len(), 3);

    let util = read(&project, "types/shared/util.d.ts");
    assert!(util.contains("shout(s: string): string"));
    let entry = read(&project, "types/cli/index.d.ts");
    assert!(entry.contains("../shared/util"));
    assert_eq!(
        read(&project, "types/index.d.ts"),
        "export * from './cli/index';\n"
    );
}

#[tokio::test]
async fn declarations_can_be_disabled() {
    let project = create_project(
        PACKAGE,
        &[("src/index.ts", "export const x: number = 1;\n")],
    );

    let report = run(&plan(&config("src/index.ts", &project).declarations(None)))
        .await
        .expect("build");

    assert!(report.entries[0].declarations.is_empty());
    assert!(!project.path().join("dist/index.d.ts").exists());
}

#[tokio::test]
async fn missing_annotations_fail_isolated_declarations() {
    let project = create_project(
        PACKAGE,
        &[("src/index.ts", "export function id(x) { return x; }\n")],
    );

    let err = run(&plan(
        &config("src/index.ts", &project).declarations(Some(DeclarationBackend::Isolated)),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Declarations { .. }), "{err}");
}

#[tokio::test]
async fn glob_builds_each_entry_and_links_siblings() {
    let project = create_project(
        PACKAGE,
        &[
            (
                "src/main.ts",
                "export const version: string = '1.0.0';\n",
            ),
            (
                "src/cli.ts",
                "import { version } from './main';\nexport const banner: string = `v${version}`;\n",
            ),
        ],
    );

    let plan = plan(&config("src/*.ts", &project).esm(true).declarations(None));
    let report = run(&plan).await.expect("build");
    assert_eq!(report.entries.len(), 2);
    assert!(report.entries[0].entry.ends_with("src/cli.ts"));
    assert!(report.entries[1].entry.ends_with("src/main.ts"));

    let cli = read(&project, "dist/cli.js");
    assert!(cli.contains("./main.js"));
    assert!(!cli.contains("1.0.0"));

    let cli_esm = read(&project, "dist/cli.mjs");
    assert!(cli_esm.contains("./main.mjs"));

    assert!(read(&project, "dist/main.js").contains("1.0.0"));
}

#[tokio::test]
async fn compress_minifies_output() {
    let source = "export function computeTheAnswer(): number {\n    const intermediateValue = 40;\n    return intermediateValue + 2;\n}\n";
    let plain = create_project(PACKAGE, &[("src/index.ts", source)]);
    let small = create_project(PACKAGE, &[("src/index.ts", source)]);

    run(&plan(&config("src/index.ts", &plain).declarations(None)))
        .await
        .expect("plain build");
    run(&plan(
        &config("src/index.ts", &small).compress(true).declarations(None),
    ))
    .await
    .expect("minified build");

    let plain = read(&plain, "dist/index.js");
    let small = read(&small, "dist/index.js");
    assert!(small.len() < plain.len());
    assert!(!small.contains("intermediateValue"));
}

#[tokio::test]
async fn lowers_syntax_for_old_targets() {
    let project = create_project(
        PACKAGE,
        &[("src/index.ts", "export const pick = (o: any): number => o?.a ?? 1;\n")],
    );

    let config = config("src/index.ts", &project)
        .target(NodeTarget::parse("12").expect("target"))
        .declarations(None);
    let build = build_entry(&plan(&config).entries[0]).await.expect("build");

    let code = build.files[0].text();
    assert!(!code.contains("?."));
    assert!(!code.contains("??"));
}

#[tokio::test]
async fn build_entry_reports_bundled_modules() {
    let project = create_project(
        PACKAGE,
        &[
            ("src/index.ts", "export * from './a';\n"),
            ("src/a.ts", "export const a: number = 1;\n"),
        ],
    );

    let plan = plan(&config("src/index.ts", &project));
    let build = build_entry(&plan.entries[0]).await.expect("build");

    assert_eq!(build.files.len(), 1);
    assert_eq!(build.files[0].file_name, "index.js");
    assert!(build.modules.iter().any(|m| m.ends_with("src/a.ts")));
    assert!(build.modules.iter().any(|m| m.ends_with("src/index.ts")));
    assert!(!project.path().join("dist").exists());
}

#[tokio::test]
async fn rebuild_overwrites_previous_output() {
    let project = create_project(
        PACKAGE,
        &[("src/index.ts", "export const v: string = 'first';\n")],
    );
    let config = config("src/index.ts", &project).declarations(None);

    run(&plan(&config)).await.expect("first build");
    assert!(read(&project, "dist/index.js").contains("first"));

    write_file(
        project.path(),
        "src/index.ts",
        "export const v: string = 'second';\n",
    );
    run(&plan(&config)).await.expect("second build");
    let code = read(&project, "dist/index.js");
    assert!(code.contains("second"));
    assert!(!code.contains("first"));
}

#[test]
fn missing_entry_is_reported() {
    let project = create_project(PACKAGE, &[]);
    let err = typebundle_bundler::BuildPlan::assemble(&config("src/nope.ts", &project))
        .unwrap_err();
    assert!(matches!(err, Error::EntryNotFound { .. }));

    let err = typebundle_bundler::BuildPlan::assemble(&config("src/*.ts", &project))
        .unwrap_err();
    assert!(matches!(err, Error::NoEntries { .. }));
}
