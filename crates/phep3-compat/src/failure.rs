//! Classification of failed resolutions.
//!
//! Not every failed `uv pip compile` is a dependency conflict. Linux-only
//! wheels in the reference environment fail on other platforms, and the
//! interpreter running the check may be outside the environment's supported
//! range. Both are screened out before the conflict interpreter runs.

use crate::conflict::{Conflict, error_summary, parse_solver_error};
use phep3_core::{BASE_CONTEXT, Finding, Severity};
use regex::Regex;
use std::sync::LazyLock;

const PLATFORM_INDICATORS: &[&str] = &[
    "no wheels with a matching platform tag",
    "no matching distribution",
    "manylinux",
    "macosx",
    "win_amd64",
    "nvidia-nccl",
    "nvidia-cuda",
];

static PYTHON_MISMATCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"current python version \([\d.]+\) does not satisfy python([<>=!]+[\d.]+)")
        .expect("python mismatch pattern must compile")
});

/// What a failed resolution means for the package being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    /// Platform-restricted wheels; not a real conflict.
    PlatformSpecific,
    /// The interpreter running the check does not satisfy the environment.
    PythonVersionMismatch { required: String },
    /// Genuine conflicts. Empty when the text could not be interpreted at all.
    Conflicts(Vec<Conflict>),
}

impl SolverOutcome {
    /// True for outcomes caused by the checking environment rather than the package.
    pub fn is_environmental(&self) -> bool {
        matches!(self, Self::PlatformSpecific | Self::PythonVersionMismatch { .. })
    }
}

pub fn is_platform_specific(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    PLATFORM_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
}

/// Returns the violated requirement, e.g. `Python>=3.12`.
pub fn python_version_mismatch(stderr: &str) -> Option<String> {
    let lower = stderr.to_lowercase();
    PYTHON_MISMATCH
        .captures(&lower)
        .map(|captures| format!("Python{}", &captures[1]))
}

/// Classifies uv stderr, running the conflict interpreter last.
pub fn interpret_solver_failure(stderr: &str, own_package: Option<&str>) -> SolverOutcome {
    if is_platform_specific(stderr) {
        return SolverOutcome::PlatformSpecific;
    }
    if let Some(required) = python_version_mismatch(stderr) {
        return SolverOutcome::PythonVersionMismatch { required };
    }
    SolverOutcome::Conflicts(parse_solver_error(stderr, own_package))
}

/// Converts an outcome into findings for one resolution group.
///
/// `context` is the extras group name, or empty / `"base"` for the base
/// dependencies. `stderr` is used only when no conflict could be extracted.
pub fn outcome_findings(
    outcome: &SolverOutcome,
    context: &str,
    report_as_warning: bool,
    stderr: &str,
) -> Vec<Finding> {
    let context = if context.is_empty() { BASE_CONTEXT } else { context };
    let severity = if report_as_warning {
        Severity::Warning
    } else {
        Severity::Error
    };

    match outcome {
        SolverOutcome::PlatformSpecific => vec![
            Finding::warning("platform", "Platform-specific packages in PyHC Environment")
                .with_details(
                    "Some packages (e.g., nvidia-nccl-cu12) are Linux-only.\n\
                     This check may fail locally on macOS/Windows but will pass on GitHub Actions.",
                )
                .with_context(context),
        ],
        SolverOutcome::PythonVersionMismatch { required } => vec![
            Finding::warning("python", "Python version mismatch with PyHC Environment")
                .with_details(format!(
                    "The PyHC Environment requires {required}.\n\
                     Your current Python version doesn't satisfy this requirement.\n\
                     Run with a compatible Python version to verify package compatibility."
                ))
                .with_context(context),
        ],
        SolverOutcome::Conflicts(conflicts) if conflicts.is_empty() => vec![
            Finding::new(severity, "dependencies", "Dependency resolution failed")
                .with_details(error_summary(stderr))
                .with_suggestion(scoped_suggestion(
                    "Inspect the resolver output above".to_string(),
                    context,
                ))
                .with_context(context),
        ],
        SolverOutcome::Conflicts(conflicts) => conflicts
            .iter()
            .map(|conflict| conflict_finding(conflict, severity, context))
            .collect(),
    }
}

pub fn conflict_finding(conflict: &Conflict, severity: Severity, context: &str) -> Finding {
    Finding::new(
        severity,
        &conflict.package,
        format!("Dependency conflict: {}", conflict.package),
    )
    .with_details(format!(
        "Your requirement: {}\nPyHC Environment: {}\n{}",
        conflict.your_requirement, conflict.pyhc_requirement, conflict.reason
    ))
    .with_suggestion(scoped_suggestion(
        format!(
            "Adjust your {} requirement to be compatible with the PyHC Environment",
            conflict.package
        ),
        context,
    ))
    .with_context(context)
}

fn scoped_suggestion(suggestion: String, context: &str) -> String {
    if context.is_empty() || context == BASE_CONTEXT {
        suggestion
    } else {
        format!("{suggestion} in [{context}]")
    }
}
