//! Formatting utilities for sizes, durations, and build summaries.

use console::Term;
use owo_colors::OwoColorize;
use std::time::Duration;

use super::paint;

/// Format file size in human-readable format.
///
/// ```
/// use typebundle_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use typebundle_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the files written by a build with their sizes.
///
/// `files` holds (display name, size in bytes) pairs. Nothing is printed
/// when quiet.
pub fn print_build_summary(files: &[(String, u64)], duration: Duration) {
    if super::is_quiet() {
        return;
    }

    let width = (Term::stderr().size().1 as usize).clamp(20, 80);

    eprintln!();
    for (name, size) in files {
        eprintln!(
            "  {} {} {}",
            paint("▸", |t| t.blue().to_string()),
            paint(name, |t| t.bright_white().bold().to_string()),
            paint(&format_size(*size), |t| t.dimmed().to_string()),
        );
    }
    eprintln!("{}", "─".repeat(width));

    let total_size: u64 = files.iter().map(|(_, s)| s).sum();
    eprintln!(
        "  {} {} in {}",
        paint("Total:", |t| t.bold().to_string()),
        paint(&format_size(total_size), |t| t.green().to_string()),
        paint(&format_duration(duration), |t| t.green().to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1), "1 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_print_build_summary() {
        print_build_summary(
            &[
                ("dist/index.js".to_string(), 15_234),
                ("dist/index.d.ts".to_string(), 312),
            ],
            Duration::from_millis(450),
        );
        print_build_summary(&[], Duration::ZERO);
    }
}
