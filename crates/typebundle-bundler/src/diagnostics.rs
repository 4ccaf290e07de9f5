//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown reports failures as batches of build diagnostics whose concrete
//! types change between releases. We only rely on their `Debug` rendering and
//! classify it into a small, stable [`ExtractedDiagnostic`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extracted diagnostic information from Rolldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub help: Option<String>,
}

/// Diagnostic kind (mirrors the Rolldown event kinds we care about).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingExport,
    ParseError,
    CircularDependency,
    UnresolvedEntry,
    UnresolvedImport,
    Plugin,
    Transform,
    Other(String),
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl ExtractedDiagnostic {
    /// A diagnostic that did not originate from Rolldown (panics, join errors).
    pub fn other(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Other(kind.into()),
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            help: None,
        }
    }

    /// `file:line:column` when a location is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        Some(match (self.line, self.column) {
            (Some(line), Some(col)) => format!("{file}:{line}:{col}"),
            (Some(line), None) => format!("{file}:{line}"),
            _ => file.to_string(),
        })
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingExport => write!(f, "MissingExport"),
            DiagnosticKind::ParseError => write!(f, "ParseError"),
            DiagnosticKind::CircularDependency => write!(f, "CircularDependency"),
            DiagnosticKind::UnresolvedEntry => write!(f, "UnresolvedEntry"),
            DiagnosticKind::UnresolvedImport => write!(f, "UnresolvedImport"),
            DiagnosticKind::Plugin => write!(f, "Plugin"),
            DiagnosticKind::Transform => write!(f, "Transform"),
            DiagnosticKind::Other(s) => write!(f, "{}", s),
        }
    }
}

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'`(,]+\.(?:[cm]?[jt]sx?|json)):(\d+):(\d+)"#).expect("valid regex")
});

static FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'`]?([^\s"'`(,]+\.(?:[cm]?[jt]sx?|json))["'`]?"#).expect("valid regex")
});

/// Extract diagnostics from Rolldown error types.
pub fn extract_from_rolldown_error(error: &dyn fmt::Debug) -> Vec<ExtractedDiagnostic> {
    let error_str = format!("{error:?}");

    if error_str.contains("BatchedBuildDiagnostic") {
        let parts: Vec<&str> = error_str
            .split("BatchedBuildDiagnostic")
            .filter(|s| !s.trim().is_empty() && s.trim() != "(")
            .collect();
        if parts.len() > 1 {
            return parts.iter().map(|part| extract_single(part)).collect();
        }
    }

    vec![extract_single(&error_str)]
}

/// Classify a single rendered diagnostic.
pub fn extract_single(error_str: &str) -> ExtractedDiagnostic {
    let kind = classify(error_str);

    let severity = if error_str.contains("Warning") || error_str.contains("warning") {
        DiagnosticSeverity::Warning
    } else {
        DiagnosticSeverity::Error
    };

    let (file, line, column) = match LOCATION.captures(error_str) {
        Some(caps) => (
            Some(caps[1].to_string()),
            caps[2].parse().ok(),
            caps[3].parse().ok(),
        ),
        None => (
            FILE.captures(error_str).map(|caps| caps[1].to_string()),
            None,
            None,
        ),
    };

    ExtractedDiagnostic {
        help: extract_help_text(error_str).or_else(|| default_help(&kind)),
        kind,
        severity,
        message: error_str.trim().to_string(),
        file,
        line,
        column,
    }
}

fn classify(error_str: &str) -> DiagnosticKind {
    if error_str.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if error_str.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if error_str.contains("UnresolvedImport") || error_str.contains("Could not resolve") {
        DiagnosticKind::UnresolvedImport
    } else if error_str.contains("Parse error")
        || error_str.contains("ParseError")
        || error_str.contains("Unexpected token")
        || error_str.contains("Expected")
    {
        DiagnosticKind::ParseError
    } else if error_str.contains("Circular") {
        DiagnosticKind::CircularDependency
    } else if error_str.contains("Plugin") {
        DiagnosticKind::Plugin
    } else if error_str.contains("Transform") || error_str.contains("transform") {
        DiagnosticKind::Transform
    } else {
        DiagnosticKind::Other("Error".to_string())
    }
}

/// Extract help text from error message.
fn extract_help_text(text: &str) -> Option<String> {
    ["help: ", "Help: ", "hint: ", "Hint: "]
        .iter()
        .find_map(|indicator| {
            let pos = text.find(indicator)?;
            let help = text[pos + indicator.len()..].lines().next()?.trim();
            (!help.is_empty()).then(|| help.to_string())
        })
}

fn default_help(kind: &DiagnosticKind) -> Option<String> {
    match kind {
        DiagnosticKind::UnresolvedImport => Some(
            "Install the missing package, or add it to dependencies so it stays external."
                .to_string(),
        ),
        DiagnosticKind::UnresolvedEntry => {
            Some("Check that the entry file exists and is readable.".to_string())
        }
        _ => None,
    }
}
