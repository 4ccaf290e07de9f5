//! Watch command: build, then rebuild whenever the package changes.

use std::path::Path;

use tokio::signal;
use typebundle_bundler::{BuildPlan, BundlerConfig, run_each};

use crate::config::TypebundleConfig;
use crate::error::Result;
use crate::ui;
use crate::watch::{
    DEFAULT_DEBOUNCE, EventDispatcher, FileWatcher, WatchEvent, events_for, next_batch,
};

/// Run the watch loop until Ctrl+C or a fatal watcher error.
///
/// Entry failures are reported and watching continues. A plan that cannot
/// be assembled on startup is returned as an error.
pub async fn execute(config: &TypebundleConfig, cwd: &Path) -> Result<()> {
    let bundler_config = config.to_bundler_config(cwd)?;
    let plan = BuildPlan::assemble(&bundler_config)?;
    let dispatcher = EventDispatcher::new(plan.cwd.clone());

    dispatcher.dispatch_all(&events_for(run_each(&plan).await, &plan.cwd))?;

    let ignored = vec![plan.out_dir.clone(), plan.types_dir.clone()];
    let (watcher, mut changes) = FileWatcher::new(plan.cwd.clone(), ignored)?;
    ui::info(&format!(
        "Watching {} (press Ctrl+C to stop)",
        watcher.root().display()
    ));

    // Created once so a Ctrl+C during a rebuild is seen on the next iteration.
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            batch = next_batch(&mut changes, DEFAULT_DEBOUNCE) => {
                let events = match batch {
                    Some(Ok(batch)) => {
                        for change in &batch {
                            tracing::debug!(path = %change.path().display(), "change detected");
                        }
                        rebuild(&bundler_config).await
                    }
                    Some(Err(err)) => vec![WatchEvent::Fatal(err.to_string())],
                    None => vec![WatchEvent::Fatal("file watcher stopped".to_string())],
                };
                dispatcher.dispatch_all(&events)?;
            }

            _ = &mut ctrl_c => {
                ui::info("Stopping watch mode...");
                break;
            }
        }
    }

    Ok(())
}

/// Re-assemble the plan so new glob matches are picked up, then build.
async fn rebuild(config: &BundlerConfig) -> Vec<WatchEvent> {
    match BuildPlan::assemble(config) {
        Ok(plan) => events_for(run_each(&plan).await, &plan.cwd),
        Err(err) => vec![
            WatchEvent::Start,
            WatchEvent::Error {
                entry: config.input.clone(),
                message: err.to_string(),
            },
            WatchEvent::End,
        ],
    }
}
