//! Terminal output: status lines, build summaries and a spinner.
//!
//! With `--quiet` only errors are printed.
//!
//! ```no_run
//! use typebundle_cli::ui;
//!
//! ui::init_colors(false);
//! ui::init_quiet(false);
//! let spinner = ui::Spinner::new("Building src/index.ts...");
//! spinner.clear();
//! ui::success("Successful build. (src/index.ts)");
//! ```

mod format;
mod messages;
mod spinner;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success};
pub use spinner::Spinner;

static COLORS_DISABLED: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
}

/// Check if color output should be enabled.
///
/// `--no-color` and `NO_COLOR` win over `FORCE_COLOR`; otherwise colors
/// follow whether stderr is a terminal.
pub fn should_use_color() -> bool {
    if COLORS_DISABLED.load(Ordering::Relaxed) {
        return false;
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support. Call early in `main`.
pub fn init_colors(no_color: bool) {
    COLORS_DISABLED.store(no_color, Ordering::Relaxed);
}

/// Silence everything but errors. Call early in `main`.
pub fn init_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Apply `color` to `text` only when colors are enabled.
pub(crate) fn paint(text: &str, color: impl FnOnce(&str) -> String) -> String {
    if should_use_color() {
        color(text)
    } else {
        text.to_string()
    }
}

/// Whether to animate progress (interactive terminal, not CI, not quiet).
pub fn is_interactive() -> bool {
    !is_quiet() && !is_ci() && console::user_attended_stderr()
}
