//! Accumulation and rendering of findings.
//!
//! A [`Reporter`] keeps findings in insertion order and renders them three
//! ways: a plain-text report for terminals, one workflow-command annotation
//! per finding, and a markdown summary for CI job pages.

use crate::error::Result;
use crate::finding::{Finding, Severity};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

/// Collects findings for one check run.
///
/// # Examples
///
/// ```
/// use phep3_core::{Finding, Reporter};
///
/// let mut reporter = Reporter::new("PHEP 3 Compliance Check");
/// reporter.add(Finding::warning("numpy", "numpy>=1.26,<3 has upper bound constraint"));
///
/// assert!(!reporter.has_errors());
/// assert!(reporter.has_warnings());
/// assert_eq!(reporter.exit_code(false), 0);
/// assert_eq!(reporter.exit_code(true), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    title: String,
    file_path: Option<String>,
    findings: Vec<Finding>,
    notes: Vec<String>,
}

impl Reporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the file that annotations point at.
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    /// Records an informational line printed ahead of the findings.
    ///
    /// Notes are not findings and never count as warnings.
    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> Vec<&Finding> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&Finding> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> Vec<&Finding> {
        self.with_severity(Severity::Info)
    }

    fn with_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Warning)
    }

    /// Renders the plain-text report, ending with the summary and status lines.
    pub fn render_plain(&self) -> String {
        let title = self.title();
        let mut out = String::new();
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
        out.push('\n');

        if !self.notes.is_empty() {
            for note in &self.notes {
                let _ = writeln!(out, "{note}");
            }
            out.push('\n');
        }

        for (heading, findings) in [
            ("ERRORS:", self.errors()),
            ("WARNINGS:", self.warnings()),
            ("INFO:", self.infos()),
        ] {
            if findings.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{heading}");
            for finding in findings {
                let _ = writeln!(out, "{}", finding.format_plain());
                out.push('\n');
            }
        }

        let _ = writeln!(
            out,
            "Summary: {} error(s), {} warning(s)",
            self.errors().len(),
            self.warnings().len()
        );
        let _ = writeln!(out, "Status: {}", self.status());
        out
    }

    pub fn status(&self) -> &'static str {
        if self.has_errors() {
            "FAILED"
        } else if self.has_warnings() {
            "PASSED (with warnings)"
        } else {
            "PASSED"
        }
    }

    /// One annotation line per finding, in insertion order.
    pub fn render_annotations(&self) -> Vec<String> {
        let file_path = self.file_path.as_deref();
        self.findings
            .iter()
            .map(|f| f.format_annotation(file_path))
            .collect()
    }

    /// Renders the markdown job summary.
    ///
    /// The `Extras` column appears only when some finding belongs to an
    /// extras group.
    pub fn render_summary(&self) -> String {
        let mut out = format!("## {}\n\n", self.title());

        let errors = self.errors();
        let warnings = self.warnings();
        if errors.is_empty() && warnings.is_empty() {
            out.push_str("All checks passed.\n");
            return out;
        }

        let show_extras = self.findings.iter().any(Finding::is_extras);
        for (heading, findings) in [("### Errors", errors), ("### Warnings", warnings)] {
            if findings.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{heading}\n");
            if show_extras {
                out.push_str("| Package | Extras | Issue | Suggestion |\n");
                out.push_str("|---------|--------|-------|------------|\n");
            } else {
                out.push_str("| Package | Issue | Suggestion |\n");
                out.push_str("|---------|-------|------------|\n");
            }
            for finding in findings {
                let suggestion = if finding.suggestion.is_empty() {
                    "-"
                } else {
                    finding.suggestion.as_str()
                };
                let message = table_cell(&finding.message);
                let suggestion = table_cell(suggestion);
                if show_extras {
                    let extras = if finding.is_extras() {
                        finding.context.as_str()
                    } else {
                        "-"
                    };
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} | {} |",
                        finding.package, extras, message, suggestion
                    );
                } else {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} |",
                        finding.package, message, suggestion
                    );
                }
            }
            out.push('\n');
        }
        out
    }

    /// Appends the markdown summary to `path`, creating the file if needed.
    pub fn append_summary(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(self.render_summary().as_bytes())?;
        tracing::debug!("wrote job summary to {}", path.display());
        Ok(())
    }

    /// Process exit status: 1 on errors, or on warnings when `fail_on_warning`.
    pub fn exit_code(&self, fail_on_warning: bool) -> i32 {
        if self.has_errors() || (fail_on_warning && self.has_warnings()) {
            1
        } else {
            0
        }
    }
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}
