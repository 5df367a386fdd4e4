//! Subcommands driven end to end against temporary projects.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use phep3_cli::cli::{CheckArgs, CompatArgs, InterpretArgs};
use phep3_cli::{CiEnvironment, check, compat_with, interpret};
use phep3_compat::{ExtrasSelection, ResolveOutput, ResolveRequest, Resolver};
use phep3_core::{Result, Severity};
use phep3_policy::{PolicyConfig, Schedule};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

const BASE_CONFLICT: &str = "  × No solution found when resolving dependencies:
  ╰─▶ Because demo==0.1.0 depends on numpy<2.0 and you require numpy>=2.0, we can conclude that your requirements are unsatisfiable.
";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn project(pyproject: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pyproject.toml"), pyproject).unwrap();
    dir
}

fn check_args(project_file: PathBuf) -> CheckArgs {
    CheckArgs {
        project_file,
        schedule: None,
        policy: None,
        fail_on_warning: false,
        no_adoption_check: false,
        ignore_errors_for: Vec::new(),
        annotations: false,
    }
}

fn compat_args(dir: &Path) -> CompatArgs {
    let packages = dir.join("packages.txt");
    std::fs::write(&packages, "# PyHC Environment\nnumpy>=2.0\ndemo==0.0.9\nsunpy==7.0.1\n")
        .unwrap();
    CompatArgs {
        project_file: dir.join("pyproject.toml"),
        packages,
        constraints: None,
        python_version: None,
        environment: None,
        extras: ExtrasSelection::Auto,
        jobs: 2,
        timeout: 60,
        uv: None,
        fail_on_warning: false,
        annotations: false,
    }
}

/// Records every request; fails the base group when `fail_base` is set.
#[derive(Default)]
struct RecordingResolver {
    fail_base: bool,
    seen: Mutex<Vec<ResolveRequest>>,
}

#[async_trait]
impl Resolver for RecordingResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveOutput> {
        self.seen.lock().unwrap().push(request.clone());
        if self.fail_base && request.extra.is_none() {
            Ok(ResolveOutput::failure(BASE_CONFLICT))
        } else {
            Ok(ResolveOutput::success())
        }
    }
}

const DEMO_PYPROJECT: &str = r#"
[project]
name = "demo"
requires-python = ">=3.10"
dependencies = ["numpy>=1.26"]

[project.optional-dependencies]
all = ["demo[doc]"]
doc = ["sphinx"]
"#;

#[test]
fn test_check_builtin_schedule_fallback() {
    let dir = project("[project]\nname = \"demo\"\nrequires-python = \">=3.13\"\n");
    let run = check(&check_args(dir.path().join("pyproject.toml")), &CiEnvironment::default(), now())
        .unwrap();

    let warnings = run.reporter.warnings();
    assert_eq!(warnings[0].package, "schedule");
    assert_eq!(
        warnings[0].message,
        "No schedule.json found - using built-in Python schedule only"
    );

    let errors = run.reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "requires-python = \">=3.13\" drops support for Python 3.11 too early"
    );
    assert_eq!(run.exit_code, 1);
}

#[test]
fn test_check_with_saved_schedule_passes() {
    let dir = project(
        "[project]\nname = \"demo\"\nrequires-python = \">=3.11\"\ndependencies = [\"requests>=2\"]\n",
    );
    let schedule_path = dir.path().join("schedule.json");
    Schedule::builtin(&PolicyConfig::default(), now())
        .save(&schedule_path)
        .unwrap();

    let summary = dir.path().join("summary.md");
    let ci = CiEnvironment {
        actions: false,
        step_summary: Some(summary.clone()),
        output: None,
    };
    let mut args = check_args(dir.path().join("pyproject.toml"));
    args.schedule = Some(schedule_path);

    let run = check(&args, &ci, now()).unwrap();
    assert!(run.reporter.findings().is_empty());
    assert_eq!(run.exit_code, 0);
    assert!(run.render().ends_with("Status: PASSED\n"));
    assert_eq!(
        std::fs::read_to_string(summary).unwrap(),
        "## PHEP 3 Compliance Check\n\nAll checks passed.\n"
    );
}

#[test]
fn test_check_fail_on_warning() {
    let dir = project("[project]\nname = \"demo\"\nrequires-python = \">=3.11\"\n");
    let mut args = check_args(dir.path().join("pyproject.toml"));

    let run = check(&args, &CiEnvironment::default(), now()).unwrap();
    assert_eq!(run.reporter.warnings().len(), 1);
    assert_eq!(run.exit_code, 0);

    args.fail_on_warning = true;
    let run = check(&args, &CiEnvironment::default(), now()).unwrap();
    assert_eq!(run.exit_code, 1);
}

#[test]
fn test_check_policy_override() {
    let dir = project("[project]\nname = \"demo\"\nrequires-python = \">=3.11\"\n");
    let policy = dir.path().join("policy.json");
    std::fs::write(&policy, r#"{"python_support_months": 24}"#).unwrap();

    let mut args = check_args(dir.path().join("pyproject.toml"));
    args.policy = Some(policy);

    let run = check(&args, &CiEnvironment::default(), now()).unwrap();
    assert!(
        run.reporter
            .warnings()
            .iter()
            .any(|w| w.message == "Python 3.11 support can be dropped per PHEP 3")
    );
    assert_eq!(run.exit_code, 0);
}

#[test]
fn test_check_missing_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = check(
        &check_args(dir.path().join("pyproject.toml")),
        &CiEnvironment::default(),
        now(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn test_check_annotations_under_actions() {
    let dir = project("[project]\nname = \"demo\"\nrequires-python = \">=3.13\"\n");
    let ci = CiEnvironment {
        actions: true,
        ..CiEnvironment::default()
    };
    let run = check(&check_args(dir.path().join("pyproject.toml")), &ci, now()).unwrap();
    assert!(run.annotations);
    assert!(run.render().contains("::error file="));
}

#[tokio::test]
async fn test_compat_runs_base_then_extras() {
    let dir = project(DEMO_PYPROJECT);
    let output = dir.path().join("github_output");
    let ci = CiEnvironment {
        output: Some(output.clone()),
        ..CiEnvironment::default()
    };
    let resolver = RecordingResolver::default();

    let run = compat_with(&resolver, &compat_args(dir.path()), &ci).await.unwrap();
    assert_eq!(run.exit_code, 0);
    assert!(run.reporter.findings().is_empty());
    assert_eq!(std::fs::read_to_string(output).unwrap(), "conflicts=0\n");

    let mut seen = resolver.seen.lock().unwrap().clone();
    seen.sort_by_key(|request| request.extra.clone());
    let extras: Vec<Option<&str>> = seen.iter().map(|r| r.extra.as_deref()).collect();
    assert_eq!(extras, vec![None, Some("all"), Some("doc")]);

    let base = &seen[0];
    assert_eq!(base.requirements[..2], ["numpy>=2.0", "sunpy==7.0.1"]);
    assert_eq!(base.requirements.len(), 3);
}

#[tokio::test]
async fn test_compat_base_conflict_fails() {
    let dir = project(DEMO_PYPROJECT);
    let output = dir.path().join("github_output");
    let ci = CiEnvironment {
        output: Some(output.clone()),
        ..CiEnvironment::default()
    };
    let resolver = RecordingResolver {
        fail_base: true,
        ..RecordingResolver::default()
    };

    let run = compat_with(&resolver, &compat_args(dir.path()), &ci).await.unwrap();
    assert_eq!(run.exit_code, 1);
    let errors = run.reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Dependency conflict: numpy");
    assert_eq!(errors[0].context, "base");
    assert_eq!(std::fs::read_to_string(output).unwrap(), "conflicts=1\n");
}

#[tokio::test]
async fn test_compat_unknown_extras() {
    let dir = project(DEMO_PYPROJECT);
    let mut args = compat_args(dir.path());
    args.extras = ExtrasSelection::List(vec!["doc".to_string(), "gpu".to_string()]);
    let resolver = RecordingResolver::default();

    let run = compat_with(&resolver, &args, &CiEnvironment::default()).await.unwrap();
    let errors = run.reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].package, "extras");
    assert_eq!(errors[0].details, "gpu");
    assert_eq!(errors[0].context, "config");
    assert_eq!(run.exit_code, 1);
    assert_eq!(resolver.seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_compat_python_precheck_stops_early() {
    let dir = project(DEMO_PYPROJECT);
    let environment = dir.path().join("environment.yml");
    std::fs::write(&environment, "dependencies:\n  - python=3.9.18\n  - pip\n").unwrap();

    let mut args = compat_args(dir.path());
    args.environment = Some(environment);
    let resolver = RecordingResolver::default();

    let run = compat_with(&resolver, &args, &CiEnvironment::default()).await.unwrap();
    assert_eq!(run.exit_code, 1);
    let errors = run.reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].package, "python");
    assert!(resolver.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_compat_missing_package_list() {
    let dir = project(DEMO_PYPROJECT);
    let mut args = compat_args(dir.path());
    args.packages = dir.path().join("missing.txt");

    let run = compat_with(&RecordingResolver::default(), &args, &CiEnvironment::default())
        .await
        .unwrap();
    assert_eq!(run.exit_code, 1);
    assert_eq!(run.reporter.errors()[0].package, "pyhc-requirements");
}

#[test]
fn test_interpret_file() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = dir.path().join("uv.log");
    std::fs::write(&stderr, BASE_CONFLICT).unwrap();

    let run = interpret(&InterpretArgs {
        file: Some(stderr),
        package: Some("demo".to_string()),
        json: false,
    })
    .unwrap();
    assert_eq!(run.exit_code, 1);
    let errors = run.reporter.errors();
    assert_eq!(errors[0].severity, Severity::Error);
    assert_eq!(errors[0].context, "base");
    assert_eq!(
        errors[0].details,
        "Your requirement: numpy<2.0\nPyHC Environment: numpy>=2.0\ndemo==0.1.0 requires numpy<2.0, but the combined requirements need numpy>=2.0"
    );
}

#[test]
fn test_interpret_json() {
    let dir = tempfile::tempdir().unwrap();
    let stderr = dir.path().join("uv.log");
    std::fs::write(
        &stderr,
        "error: distribution nvidia-nccl-cu12==2.20.5 has no wheels with a matching platform tag\n",
    )
    .unwrap();

    let run = interpret(&InterpretArgs {
        file: Some(stderr),
        package: None,
        json: true,
    })
    .unwrap();
    assert_eq!(run.exit_code, 0);
    let findings: serde_json::Value = serde_json::from_str(&run.render()).unwrap();
    assert_eq!(findings[0]["package"], "platform");
    assert_eq!(findings[0]["severity"], "warning");
}
