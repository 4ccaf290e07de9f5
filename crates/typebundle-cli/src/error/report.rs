//! Conversion of CLI errors into miette reports.

use miette::Report;

use crate::error::{BuildError, CliError};

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundler(e) => bundler_error_to_miette(e),
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::WatchFailed(message) => miette::miette!(
            help = "Fix the error above and start typebundle --watch again",
            "Watch mode stopped: {}",
            message
        ),
        _ => miette::miette!("{}", err),
    }
}

/// Convert a bundler Error to miette Report
///
/// Single bundler diagnostics are reported with their location and help;
/// everything else uses the library's `Diagnostic` implementation.
pub fn bundler_error_to_miette(err: typebundle_bundler::Error) -> Report {
    match err {
        typebundle_bundler::Error::Bundler(diagnostics) if diagnostics.len() == 1 => {
            let diag = &diagnostics[0];
            let location = diag
                .location()
                .map(|loc| format!("\n  at {loc}"))
                .unwrap_or_default();
            match &diag.help {
                Some(help) => miette::miette!(
                    help = help.clone(),
                    "{}: {}{}",
                    diag.kind,
                    diag.message,
                    location
                ),
                None => miette::miette!("{}: {}{}", diag.kind, diag.message, location),
            }
        }
        other => Report::new(other),
    }
}
