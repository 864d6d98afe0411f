//! Core diagnostic types.

use rill_ir::Region;
use std::fmt;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    /// Returns `true` for `Error`.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A labeled source region with an explanatory message.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Label {
    pub region: Region,
    pub message: String,
}

impl Label {
    /// Create a new label.
    pub fn new(region: Region, message: impl Into<String>) -> Self {
        Label {
            region,
            message: message.into(),
        }
    }
}

/// A structured diagnostic report.
///
/// Built by phase code through the factory functions in this crate (or the
/// builder methods here), rendered only at the driver boundary.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    /// Report title; defaults to the code's title.
    pub title: String,
    /// Primary human-readable message.
    pub message: String,
    /// Primary source region, underlined when source is available.
    pub region: Option<Region>,
    /// Secondary labeled regions.
    pub labels: Vec<Label>,
    /// Optional fix hint.
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic with the code's default title.
    pub fn error(code: ErrorCode) -> Self {
        Diagnostic {
            code,
            severity: Severity::Error,
            title: code.title().to_owned(),
            message: String::new(),
            region: None,
            labels: Vec::new(),
            hint: None,
        }
    }

    /// Create a warning diagnostic with the code's default title.
    pub fn warning(code: ErrorCode) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Self::error(code)
        }
    }

    /// Set the primary message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the primary region.
    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Add a secondary label.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Set the hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// One-line summary used by the `PROBLEMS` snapshot section:
    /// `name@start..end: message` (region omitted when absent).
    pub fn summary(&self) -> String {
        match self.region {
            Some(region) => format!("{}@{}: {}", self.code.name(), region, self.message),
            None => format!("{}: {}", self.code.name(), self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_fills_defaults_from_code() {
        let diag = Diagnostic::error(ErrorCode::E3001)
            .with_message("nothing is named `foo` in this scope")
            .with_region(Region::new(4, 7));
        assert_eq!(diag.title, "UNKNOWN NAME");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(
            diag.summary(),
            "ident_not_in_scope@4..7: nothing is named `foo` in this scope"
        );
    }

    #[test]
    fn warning_severity() {
        let diag = Diagnostic::warning(ErrorCode::E3002);
        assert_eq!(diag.severity, Severity::Warning);
        assert!(!diag.severity.is_error());
    }
}
