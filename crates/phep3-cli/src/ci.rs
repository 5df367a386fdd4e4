//! GitHub Actions integration points.

use phep3_core::{Reporter, Result};
use std::io::Write as _;
use std::path::PathBuf;

/// The workflow environment, captured once at startup.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
    /// `GITHUB_ACTIONS=true`: emit workflow-command annotations by default.
    pub actions: bool,
    /// `GITHUB_STEP_SUMMARY`: markdown job summary file.
    pub step_summary: Option<PathBuf>,
    /// `GITHUB_OUTPUT`: step output file.
    pub output: Option<PathBuf>,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        Self {
            actions: std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
            step_summary: path_var("GITHUB_STEP_SUMMARY"),
            output: path_var("GITHUB_OUTPUT"),
        }
    }

    /// Appends the reporter's markdown summary to the job summary, if any.
    pub fn publish_summary(&self, reporter: &Reporter) -> Result<()> {
        match &self.step_summary {
            Some(path) => reporter.append_summary(path),
            None => Ok(()),
        }
    }

    /// Appends `key=value` to the step output file, if any.
    pub fn set_output(&self, key: &str, value: impl std::fmt::Display) -> Result<()> {
        let Some(path) = &self.output else {
            return Ok(());
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{key}={value}")?;
        tracing::debug!("set step output {} in {}", key, path.display());
        Ok(())
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
