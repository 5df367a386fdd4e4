//! Running `uv pip compile` per resolution group.

use crate::conflict::Conflict;
use crate::failure::{SolverOutcome, interpret_solver_failure, outcome_findings};
use crate::groups::ResolveRequest;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use phep3_core::{CheckError, Finding, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Raw result of one resolver invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutput {
    pub success: bool,
    pub stderr: String,
}

impl ResolveOutput {
    pub fn success() -> Self {
        Self {
            success: true,
            stderr: String::new(),
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
        }
    }
}

/// Dependency resolver backend.
///
/// Implementations must be independent per call: [`run_groups`] may invoke
/// `resolve` for several groups concurrently.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveOutput>;
}

/// Resolver that shells out to `uv pip compile`.
#[derive(Debug, Clone)]
pub struct UvResolver {
    uv_path: PathBuf,
    timeout: Duration,
}

impl UvResolver {
    pub fn new(uv_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            uv_path: uv_path.into(),
            timeout,
        }
    }

    /// Locates `uv` on `PATH` or in the usual install directories.
    pub fn discover(timeout: Duration) -> Result<Self> {
        find_uv()
            .map(|path| Self::new(path, timeout))
            .ok_or_else(|| CheckError::ResolverNotFound("uv".to_string()))
    }

    pub fn uv_path(&self) -> &Path {
        &self.uv_path
    }

    /// Arguments after the `uv` executable.
    pub fn command_args(
        request: &ResolveRequest,
        requirements_file: &Path,
        constraints_file: Option<&Path>,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["pip".into(), "compile".into()];
        args.push(requirements_file.into());
        if let Some(constraints) = constraints_file {
            args.push("-c".into());
            args.push(constraints.into());
        }
        args.push("--quiet".into());
        if let Some(version) = request.python_version.as_deref().and_then(minor_version) {
            args.push("--python-version".into());
            args.push(version.into());
        }
        args
    }

    /// The `uv` invocation, run from `working_dir` without touching the user's cache.
    pub fn command(&self, args: &[OsString], working_dir: &Path) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.uv_path);
        command
            .args(args)
            .current_dir(working_dir)
            .env("UV_NO_CACHE", "1")
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Resolver for UvResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveOutput> {
        let group = request.label();
        let dir = tempfile::tempdir()?;

        let requirements_file = dir.path().join("requirements.txt");
        tokio::fs::write(&requirements_file, lines(&request.requirements)).await?;

        let constraints_file = if request.constraints.is_empty() {
            None
        } else {
            let path = dir.path().join("constraints.txt");
            tokio::fs::write(&path, lines(&request.constraints)).await?;
            Some(path)
        };

        let args = Self::command_args(request, &requirements_file, constraints_file.as_deref());
        tracing::debug!("running {} {:?} for {}", self.uv_path.display(), args, group);

        let mut command = self.command(&args, dir.path());
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckError::ResolverNotFound(self.uv_path.display().to_string()));
            }
            Ok(Err(e)) => return Err(CheckError::resolver(group, e.to_string())),
            Err(_) => {
                return Err(CheckError::ResolverTimeout {
                    group,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        Ok(ResolveOutput {
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Outcome of one group after interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub extra: Option<String>,
    /// False only for genuine conflicts or resolver failures.
    pub compatible: bool,
    pub conflicts: Vec<Conflict>,
    pub findings: Vec<Finding>,
}

/// Resolves every request with at most `max_concurrency` in flight.
///
/// Reports come back in the order of `requests`, whatever order the
/// invocations finish in. A failed invocation becomes one finding and is not
/// retried.
pub async fn run_groups<R>(
    resolver: &R,
    requests: Vec<ResolveRequest>,
    own_package: Option<&str>,
    max_concurrency: usize,
) -> Vec<GroupReport>
where
    R: Resolver + ?Sized,
{
    stream::iter(requests)
        .map(|request| async move {
            let result = resolver.resolve(&request).await;
            group_report(&request, result, own_package)
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await
}

fn group_report(
    request: &ResolveRequest,
    result: Result<ResolveOutput>,
    own_package: Option<&str>,
) -> GroupReport {
    let report_as_warning = request.extra.is_some();
    let context = request.context();

    let (compatible, conflicts, findings) = match result {
        Ok(output) if output.success => (true, Vec::new(), Vec::new()),
        Ok(output) => {
            let outcome = interpret_solver_failure(&output.stderr, own_package);
            let findings = outcome_findings(&outcome, context, report_as_warning, &output.stderr);
            let compatible = outcome.is_environmental();
            let conflicts = match outcome {
                SolverOutcome::Conflicts(conflicts) => conflicts,
                SolverOutcome::PlatformSpecific | SolverOutcome::PythonVersionMismatch { .. } => {
                    Vec::new()
                }
            };
            (compatible, conflicts, findings)
        }
        Err(e) => {
            tracing::warn!("resolver failed for {}: {}", request.label(), e);
            let finding = Finding::new(request.severity(), "uv", "Dependency resolution could not run")
                .with_details(e.to_string())
                .with_context(context);
            (false, Vec::new(), vec![finding])
        }
    };

    GroupReport {
        extra: request.extra.clone(),
        compatible,
        conflicts,
        findings,
    }
}

fn find_uv() -> Option<PathBuf> {
    if let Ok(path) = which::which("uv") {
        return Some(path);
    }
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut candidates = Vec::new();
    if let Some(home) = &home {
        candidates.push(home.join(".cargo").join("bin").join("uv"));
        candidates.push(home.join(".local").join("bin").join("uv"));
    }
    candidates.push(PathBuf::from("/usr/local/bin/uv"));
    candidates.into_iter().find(|candidate| candidate.exists())
}

/// `3.12.9` -> `3.12`
fn minor_version(version: &str) -> Option<String> {
    let mut parts = version.trim().split('.');
    let major = parts.next().filter(|p| !p.is_empty())?;
    let minor = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{major}.{minor}"))
}

fn lines(items: &[String]) -> String {
    let mut content = items.join("\n");
    content.push('\n');
    content
}
