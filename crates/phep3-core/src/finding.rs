use serde::{Deserialize, Serialize};
use std::fmt;

/// Context value used for findings about base (non-extras) dependencies.
pub const BASE_CONTEXT: &str = "base";

/// Severity of a [`Finding`].
///
/// Only errors fail a check by default; warnings fail it when the caller
/// opts into `fail_on_warning`. Info findings never affect the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Bracketed prefix used in plain-text reports.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Error => "[ERROR]",
            Self::Warning => "[WARN]",
            Self::Info => "[INFO]",
        }
    }

    /// Workflow-command level used for CI annotations.
    pub fn annotation_level(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "notice",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// A single compliance or compatibility issue.
///
/// `context` names the extras group a finding belongs to. An empty context or
/// `"base"` means the base dependency set.
///
/// # Examples
///
/// ```
/// use phep3_core::{Finding, Severity};
///
/// let finding = Finding::error("numpy", "numpy>=2.1 drops support for numpy 1.26 too early")
///     .with_details("numpy 1.26 must still be supported per PHEP 3")
///     .with_suggestion("Change to numpy>=1.26");
///
/// assert_eq!(finding.severity, Severity::Error);
/// assert!(!finding.is_extras());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub package: String,
    pub message: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub context: String,
}

impl Finding {
    pub fn new(severity: Severity, package: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            package: package.into(),
            message: message.into(),
            details: String::new(),
            suggestion: String::new(),
            context: String::new(),
        }
    }

    pub fn error(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, package, message)
    }

    pub fn warning(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, package, message)
    }

    pub fn info(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, package, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns true when the finding belongs to an extras group.
    pub fn is_extras(&self) -> bool {
        !self.context.is_empty() && self.context != BASE_CONTEXT
    }

    /// Formats the finding as an indented plain-text block.
    pub fn format_plain(&self) -> String {
        let mut lines = vec![format!("{} {}", self.severity.prefix(), self.message)];
        if !self.details.is_empty() {
            for detail in self.details.split('\n') {
                lines.push(format!("        {detail}"));
            }
        }
        if !self.suggestion.is_empty() {
            lines.push(format!("        Suggested: {}", self.suggestion));
        }
        if self.is_extras() {
            lines.push(format!("        Extras: {}", self.context));
        }
        lines.join("\n")
    }

    /// Formats the finding as a workflow-command annotation.
    ///
    /// The message payload is escaped so multi-line details stay on one line.
    pub fn format_annotation(&self, file_path: Option<&str>) -> String {
        let level = self.severity.annotation_level();
        let title = escape_property(&format!("PHEP 3: {}", self.package));
        let mut message = self.message.clone();
        if !self.details.is_empty() {
            message.push_str(" - ");
            message.push_str(&self.details);
        }
        let message = escape_data(&message);

        match file_path {
            Some(path) if !path.is_empty() => {
                format!(
                    "::{level} file={},title={title}::{message}",
                    escape_property(path)
                )
            }
            _ => format!("::{level} title={title}::{message}"),
        }
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(',', "%2C")
}
