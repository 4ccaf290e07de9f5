//! Status message functions for terminal output.

use owo_colors::OwoColorize;

use super::paint;

/// Print a success message to stderr, unless quiet.
pub fn success(message: &str) {
    if super::is_quiet() {
        return;
    }
    eprintln!("{} {}", paint("✓", |t| t.green().bold().to_string()), message);
}

/// Print an info message to stderr, unless quiet.
pub fn info(message: &str) {
    if super::is_quiet() {
        return;
    }
    eprintln!("{} {}", paint("ℹ", |t| t.blue().bold().to_string()), message);
}

/// Print an error message to stderr, even when quiet.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", |t| t.red().bold().to_string()),
        paint(message, |t| t.red().to_string())
    );
}
