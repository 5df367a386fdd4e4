//! Subcommand implementations.

use crate::ci::CiEnvironment;
use crate::cli::{CheckArgs, CompatArgs, InterpretArgs};
use chrono::{DateTime, Utc};
use phep3_compat::{
    ResolveRequest, Resolver, UvResolver, check_python_compatibility, exclude_package,
    interpret_solver_failure, outcome_findings, plan_extras, python_conflict_finding,
    python_version_from_environment, run_groups,
};
use phep3_core::{BASE_CONTEXT, CheckError, Finding, Reporter, Result};
use phep3_policy::{CheckOptions, PolicyConfig, Schedule, check_compliance};
use phep3_pypi::{ProjectMetadata, parse_package_specs, parse_pyproject_file};
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEDULE_FILE: &str = "schedule.json";
const UV_INSTALL_HINT: &str = "Install uv: curl -LsSf https://astral.sh/uv/install.sh | sh";

/// A finished run: the findings plus how to present them.
#[derive(Debug)]
pub struct RunReport {
    pub reporter: Reporter,
    pub exit_code: i32,
    pub annotations: bool,
    /// Replaces the plain report when set.
    pub json: Option<String>,
}

impl RunReport {
    fn new(reporter: Reporter, exit_code: i32, annotations: bool) -> Self {
        Self {
            reporter,
            exit_code,
            annotations,
            json: None,
        }
    }

    /// Text for standard output.
    pub fn render(&self) -> String {
        if let Some(json) = &self.json {
            return format!("{json}\n");
        }
        let mut out = self.reporter.render_plain();
        if self.annotations {
            for line in self.reporter.render_annotations() {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

/// `phep3 check`
pub fn check(args: &CheckArgs, ci: &CiEnvironment, now: DateTime<Utc>) -> Result<RunReport> {
    let project_file = &args.project_file;
    ensure_exists(project_file)?;

    let mut reporter = Reporter::new("PHEP 3 Compliance Check")
        .with_file_path(project_file.display().to_string());

    let policy = match &args.policy {
        Some(path) => PolicyConfig::load(path)?,
        None => PolicyConfig::default(),
    };

    let schedule = match find_schedule(args.schedule.as_deref(), project_file) {
        Some(path) => Schedule::load(&path)?,
        None => {
            reporter.add(
                Finding::warning(
                    "schedule",
                    "No schedule.json found - using built-in Python schedule only",
                )
                .with_details("Core package version checking requires schedule.json"),
            );
            Schedule::builtin(&policy, now)
        }
    };

    let metadata = match parse_pyproject_file(project_file) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("could not read {}: {}", project_file.display(), e);
            reporter.add(
                Finding::warning("-", format!("Failed to parse pyproject.toml: {e}"))
                    .with_suggestion("Declare metadata in a PEP 621 [project] table"),
            );
            ProjectMetadata::default()
        }
    };

    let options = CheckOptions {
        check_adoption: !args.no_adoption_check,
        policy,
        ..CheckOptions::default()
    }
    .with_ignored(&args.ignore_errors_for);

    reporter.extend(check_compliance(&metadata, &schedule, now, &options));
    ci.publish_summary(&reporter)?;

    let exit_code = reporter.exit_code(args.fail_on_warning);
    Ok(RunReport::new(
        reporter,
        exit_code,
        args.annotations || ci.actions,
    ))
}

/// `phep3 compat` with the discovered (or configured) `uv`.
pub async fn compat(args: &CompatArgs, ci: &CiEnvironment) -> Result<RunReport> {
    let timeout = Duration::from_secs(args.timeout);
    let resolver = match &args.uv {
        Some(path) => UvResolver::new(path, timeout),
        None => match UvResolver::discover(timeout) {
            Ok(resolver) => resolver,
            Err(e) => {
                let mut reporter = Reporter::new("PyHC Environment Compatibility Check");
                reporter.add(
                    Finding::error("uv", "uv not found")
                        .with_details(e.to_string())
                        .with_suggestion(UV_INSTALL_HINT),
                );
                ci.publish_summary(&reporter)?;
                return Ok(RunReport::new(reporter, 1, args.annotations || ci.actions));
            }
        },
    };
    tracing::debug!("using uv at {}", resolver.uv_path().display());
    compat_with(&resolver, args, ci).await
}

/// `phep3 compat` against any [`Resolver`].
pub async fn compat_with<R>(resolver: &R, args: &CompatArgs, ci: &CiEnvironment) -> Result<RunReport>
where
    R: Resolver + ?Sized,
{
    let annotations = args.annotations || ci.actions;
    let (manifest, project_dir) = project_paths(&args.project_file)?;
    let metadata = parse_pyproject_file(&manifest)?;

    let mut reporter = Reporter::new("PyHC Environment Compatibility Check")
        .with_file_path(manifest.display().to_string());

    let reference = match std::fs::read_to_string(&args.packages) {
        Ok(text) => parse_package_specs(&text),
        Err(e) => {
            reporter.add(
                Finding::error("pyhc-requirements", format!("Failed to load PyHC requirements: {e}"))
                    .with_context(BASE_CONTEXT),
            );
            ci.publish_summary(&reporter)?;
            return Ok(RunReport::new(reporter, 1, annotations));
        }
    };
    let reference = match metadata.name.as_deref() {
        Some(own) => exclude_package(&reference, own),
        None => reference,
    };

    let constraints = match &args.constraints {
        Some(path) => parse_package_specs(&std::fs::read_to_string(path)?),
        None => Vec::new(),
    };

    let python_version = match (&args.python_version, &args.environment) {
        (Some(version), _) => Some(version.clone()),
        (None, Some(path)) => python_version_from_environment(&std::fs::read_to_string(path)?),
        (None, None) => None,
    };

    if let Some(python) = python_version.as_deref()
        && let Some(conflict) = check_python_compatibility(metadata.requires_python.as_deref(), python)
    {
        reporter.add(python_conflict_finding(&conflict));
        ci.publish_summary(&reporter)?;
        return Ok(RunReport::new(reporter, 1, annotations));
    }

    let available: Vec<&str> = metadata.extras_names().collect();
    let plan = plan_extras(&args.extras, &available);
    if let Some(finding) = plan.unknown_finding() {
        reporter.add(finding);
    }

    let requests: Vec<ResolveRequest> = std::iter::once(None)
        .chain(plan.extras.iter().map(|extra| Some(extra.as_str())))
        .map(|extra| {
            ResolveRequest::for_project(
                &project_dir,
                extra,
                &reference,
                &constraints,
                python_version.as_deref(),
            )
        })
        .collect();

    reporter.note(format!(
        "Resolving base dependencies and {} extras group(s) against {} reference packages",
        plan.extras.len(),
        reference.len()
    ));

    let reports = run_groups(resolver, requests, metadata.name.as_deref(), args.jobs).await;

    let base_compatible = reports.first().is_some_and(|report| report.compatible);
    let total_conflicts: usize = reports.iter().map(|report| report.conflicts.len()).sum();
    for report in reports {
        reporter.extend(report.findings);
    }

    ci.publish_summary(&reporter)?;
    ci.set_output("conflicts", total_conflicts)?;

    let passed = base_compatible && reporter.exit_code(args.fail_on_warning) == 0;
    Ok(RunReport::new(reporter, i32::from(!passed), annotations))
}

/// `phep3 interpret`
pub fn interpret(args: &InterpretArgs) -> Result<RunReport> {
    let stderr = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let outcome = interpret_solver_failure(&stderr, args.package.as_deref());
    let mut reporter = Reporter::new("uv Resolution Failure");
    reporter.extend(outcome_findings(&outcome, BASE_CONTEXT, false, &stderr));

    let exit_code = reporter.exit_code(false);
    let mut run = RunReport::new(reporter, exit_code, false);
    if args.json {
        run.json = Some(serde_json::to_string_pretty(run.reporter.findings())?);
    }
    Ok(run)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CheckError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )))
    }
}

/// Explicit path first, then the working directory, then next to the manifest.
fn find_schedule(explicit: Option<&Path>, project_file: &Path) -> Option<PathBuf> {
    let beside_project = project_file
        .parent()
        .map(|dir| dir.join(SCHEDULE_FILE));

    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(PathBuf::from(SCHEDULE_FILE)))
        .chain(beside_project)
        .find(|candidate| candidate.is_file())
}

/// Splits the positional argument into (manifest, absolute project directory).
fn project_paths(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let (manifest, dir) = if path.is_dir() {
        (path.join("pyproject.toml"), path.to_path_buf())
    } else {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (path.to_path_buf(), dir)
    };
    ensure_exists(&manifest)?;
    Ok((manifest, std::fs::canonicalize(dir)?))
}
