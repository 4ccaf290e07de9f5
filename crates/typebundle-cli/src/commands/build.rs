//! One-shot build command.

use std::path::Path;

use typebundle_bundler::{BuildPlan, BuildReport};

use crate::commands::utils::display_path;
use crate::config::TypebundleConfig;
use crate::error::Result;
use crate::ui;

/// Build every entry once and print a summary.
///
/// # Errors
///
/// Returns errors for an unusable configuration, a plan that cannot be
/// assembled (missing `package.json`, unmatched input) and failed entries.
pub async fn execute(config: &TypebundleConfig, cwd: &Path) -> Result<BuildReport> {
    let bundler_config = config.to_bundler_config(cwd)?;
    let plan = BuildPlan::assemble(&bundler_config)?;

    let count = plan.entries.len();
    let spinner = ui::Spinner::new(&format!(
        "Bundling {count} {}...",
        if count == 1 { "entry" } else { "entries" }
    ));

    let report = match typebundle_bundler::run(&plan).await {
        Ok(report) => {
            spinner.clear();
            report
        }
        Err(err) => {
            spinner.fail("Build failed");
            return Err(err.into());
        }
    };

    for entry in &report.entries {
        ui::success(&format!(
            "Successful build. ({})",
            display_path(&entry.entry, &plan.cwd)
        ));
    }

    let files: Vec<(String, u64)> = report
        .files()
        .map(|path| {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            (display_path(path, &plan.cwd), size)
        })
        .collect();
    ui::print_build_summary(&files, report.duration);

    Ok(report)
}
