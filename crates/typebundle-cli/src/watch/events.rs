//! Build events emitted by the watch loop and the dispatcher that reports them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use typebundle_bundler::EntryReport;

use crate::commands::utils::display_path;
use crate::error::{BuildError, Result};
use crate::ui;

/// One step of a watch-mode build cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A build cycle started
    Start,
    /// An entry finished building
    EntryEnd { entry: PathBuf, duration: Duration },
    /// An entry (or the plan for it) failed; watching continues
    Error { entry: String, message: String },
    /// The build cycle finished
    End,
    /// Watching cannot continue
    Fatal(String),
}

/// Turn per-entry results into the events of one build cycle, in entry order.
pub fn events_for(
    results: Vec<(PathBuf, typebundle_bundler::Result<EntryReport>)>,
    cwd: &Path,
) -> Vec<WatchEvent> {
    let mut events = Vec::with_capacity(results.len() + 2);
    events.push(WatchEvent::Start);
    for (entry, result) in results {
        events.push(match result {
            Ok(report) => WatchEvent::EntryEnd {
                entry: report.entry,
                duration: report.duration,
            },
            Err(err) => WatchEvent::Error {
                entry: display_path(&entry, cwd),
                message: err.to_string(),
            },
        });
    }
    events.push(WatchEvent::End);
    events
}

/// Prints watch events for the user.
pub struct EventDispatcher {
    cwd: PathBuf,
}

impl EventDispatcher {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Report `event`. Returns an error for [`WatchEvent::Fatal`], which
    /// ends the watch loop.
    pub fn dispatch(&self, event: &WatchEvent) -> Result<()> {
        match event {
            WatchEvent::Start => {
                tracing::debug!("build cycle started");
            }
            WatchEvent::EntryEnd { entry, duration } => {
                let entry = display_path(entry, &self.cwd);
                tracing::debug!(%entry, duration_ms = duration.as_millis() as u64, "entry built");
                ui::success(&format!("Successful build. ({entry})"));
            }
            WatchEvent::Error { entry, message } => {
                ui::error(&format!("Build failed. ({entry})\n{message}"));
            }
            WatchEvent::End => {
                ui::info("Watching for changes...");
            }
            WatchEvent::Fatal(message) => {
                return Err(BuildError::WatchFailed(message.clone()).into());
            }
        }
        Ok(())
    }

    /// Dispatch every event, stopping at the first fatal one.
    pub fn dispatch_all(&self, events: &[WatchEvent]) -> Result<()> {
        events.iter().try_for_each(|event| self.dispatch(event))
    }
}
