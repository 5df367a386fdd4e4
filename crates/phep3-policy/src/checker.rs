//! PHEP 3 compliance evaluation.
//!
//! [`check_compliance`] runs two independent axes over a project:
//!
//! - **Python**: is `requires-python` dropping a runtime too early, still
//!   pinned to an expired runtime, or blocking a runtime that must be adopted?
//! - **Dependencies**: for each core-package dependency, the same questions
//!   about its lower bound, plus warnings for upper bounds and pins.
//!
//! Findings come out in a fixed order (Python first, then base dependencies
//! in declaration order, then each extras group in file order) so two runs
//! with the same inputs and the same `now` produce identical output.

use crate::config::PolicyConfig;
use crate::schedule::{Component, Schedule};
use chrono::{DateTime, Utc};
use pep440_rs::{Version, VersionSpecifiers};
use phep3_core::{BASE_CONTEXT, Finding, Severity};
use phep3_pypi::{
    MarkerApplicability, ParsedDependency, ProjectMetadata, VersionBounds, extract_bounds,
    major_minor, minor_string, normalize_package_name, python_marker_applicability, same_minor,
};
use std::collections::BTreeSet;
use std::str::FromStr;

const PYTHON: &str = "python";

/// Caller-controlled switches for one compliance run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Verify that newly released versions are not excluded.
    pub check_adoption: bool,
    /// Base dependencies whose errors are reported as warnings.
    pub ignore_errors_for: BTreeSet<String>,
    pub policy: PolicyConfig,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_adoption: true,
            ignore_errors_for: BTreeSet::new(),
            policy: PolicyConfig::default(),
        }
    }
}

impl CheckOptions {
    /// Adds package names to the ignore set, normalized.
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_errors_for.extend(
            names
                .into_iter()
                .map(|n| normalize_package_name(n.as_ref().trim()))
                .filter(|n| !n.is_empty()),
        );
        self
    }

    fn ignores(&self, name: &str) -> bool {
        self.ignore_errors_for
            .contains(&normalize_package_name(name))
    }
}

/// Where a dependency was declared and how its violations are reported.
#[derive(Debug, Clone, Copy)]
struct DependencyContext<'a> {
    /// Extras group name, or [`BASE_CONTEXT`].
    group: &'a str,
    report_as_warning: bool,
}

impl DependencyContext<'_> {
    fn base(options: &CheckOptions, dep: &ParsedDependency) -> Self {
        DependencyContext {
            group: BASE_CONTEXT,
            report_as_warning: options.ignores(&dep.name),
        }
    }

    fn tag(&self, finding: Finding) -> Finding {
        finding.with_context(self.group)
    }

    fn violation(&self, finding: Finding) -> Finding {
        let severity = if self.report_as_warning {
            Severity::Warning
        } else {
            Severity::Error
        };
        self.tag(finding.with_severity(severity))
    }
}

/// Evaluates a project against the schedule at `now`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use phep3_policy::{CheckOptions, PolicyConfig, Schedule, check_compliance};
/// use phep3_pypi::parse_pyproject;
///
/// let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
/// let schedule = Schedule::builtin(&PolicyConfig::default(), now);
/// let project = parse_pyproject("[project]\nrequires-python = \">=3.13\"\n").unwrap();
///
/// let findings = check_compliance(&project, &schedule, now, &CheckOptions::default());
/// assert!(findings[0].message.contains("drops support for Python 3.11 too early"));
/// ```
pub fn check_compliance(
    project: &ProjectMetadata,
    schedule: &Schedule,
    now: DateTime<Utc>,
    options: &CheckOptions,
) -> Vec<Finding> {
    let requires_python = project.requires_python.as_deref();
    let mut findings: Vec<Finding> = check_python_version(requires_python, schedule, now, &options.policy)
        .into_iter()
        .map(|finding| finding.with_context(BASE_CONTEXT))
        .collect();

    let supported = supported_python_versions(requires_python, schedule, now);
    tracing::debug!("supported Python versions for marker evaluation: {:?}", supported);

    for dep in &project.dependencies {
        let context = DependencyContext::base(options, dep);
        findings.extend(check_dependency_in(dep, schedule, now, options, &supported, context));
    }

    for group in &project.optional_dependencies {
        let context = DependencyContext {
            group: &group.name,
            report_as_warning: true,
        };
        for dep in &group.dependencies {
            findings.extend(check_dependency_in(dep, schedule, now, options, &supported, context));
        }
    }

    findings
}

/// Returns true when `findings` should not fail the run.
pub fn passes(findings: &[Finding], fail_on_warning: bool) -> bool {
    !findings.iter().any(|f| {
        f.severity == Severity::Error || (fail_on_warning && f.severity == Severity::Warning)
    })
}

/// Non-droppable Python versions that `requires-python` admits.
///
/// Falls back to every non-droppable version when `requires-python` is
/// absent or unparseable.
pub fn supported_python_versions(
    requires_python: Option<&str>,
    schedule: &Schedule,
    now: DateTime<Utc>,
) -> Vec<String> {
    let candidates = schedule.non_droppable_versions(Component::Python, now);
    let Some(requires_python) = requires_python else {
        return candidates;
    };
    let specifiers = match VersionSpecifiers::from_str(requires_python) {
        Ok(specifiers) => specifiers,
        Err(e) => {
            tracing::warn!("Could not parse requires-python '{}': {}", requires_python, e);
            return candidates;
        }
    };

    candidates
        .into_iter()
        .filter(|v| {
            Version::from_str(v)
                .map(|version| specifiers.contains(&version))
                .unwrap_or(false)
        })
        .collect()
}

/// Checks the `requires-python` declaration.
pub fn check_python_version(
    requires_python: Option<&str>,
    schedule: &Schedule,
    now: DateTime<Utc>,
    policy: &PolicyConfig,
) -> Vec<Finding> {
    let Some(requires_python) = requires_python.map(str::trim).filter(|s| !s.is_empty()) else {
        return vec![
            Finding::warning(PYTHON, "No requires-python specified")
                .with_details("Consider adding requires-python to specify supported Python versions")
                .with_suggestion(
                    "Consider using requires-python to specify supported Python versions",
                ),
        ];
    };

    let bounds = extract_bounds(Some(requires_python));
    let Some(floor) = bounds.lower.clone().or_else(|| bounds.exact.clone()) else {
        return vec![Finding::warning(
            PYTHON,
            format!("Could not parse requires-python: {requires_python}"),
        )];
    };

    let mut findings = Vec::new();
    let floor_minor = minor_string(&floor);
    let min_required = schedule.minimum_required_version(Component::Python, now);
    let min_required_version = min_required.as_deref().and_then(parse_version);

    if let (Some(min_required), Some(min_version)) = (&min_required, &min_required_version)
        && floor > *min_version
    {
        findings.push(
            Finding::error(
                PYTHON,
                format!(
                    "requires-python = \"{requires_python}\" drops support for Python {min_required} too early"
                ),
            )
            .with_details(format!("Python {min_required} must still be supported per PHEP 3"))
            .with_suggestion(format!("Change to requires-python = \">={min_required}\"")),
        );
    }

    match schedule.get(Component::Python, &floor_minor) {
        Some(entry) if entry.is_droppable(now) => {
            let mut details = format!(
                "Python {floor_minor} released {} months ago (>{} months)",
                entry.months_since_release(now),
                policy.python_support_months
            );
            let mut finding = Finding::warning(
                PYTHON,
                format!("Python {floor_minor} support can be dropped per PHEP 3"),
            );
            if let Some(min_required) = &min_required {
                details.push_str(&format!(". The minimum required version is {min_required}"));
                finding = finding.with_suggestion(format!("Minimum required version: {min_required}"));
            }
            findings.push(finding.with_details(details));
        }
        None => {
            if let (Some(min_required), Some(min_version)) = (&min_required, &min_required_version)
                && major_minor(&floor) < major_minor(min_version)
            {
                findings.push(
                    Finding::warning(
                        PYTHON,
                        format!("Python {floor_minor} support can be dropped per PHEP 3"),
                    )
                    .with_details(format!(
                        "Python {floor_minor} is older than the minimum required version ({min_required})"
                    ))
                    .with_suggestion(format!("Minimum required version: {min_required}")),
                );
            }
        }
        Some(_) => {}
    }

    let required: Vec<(String, Version)> = schedule
        .required_versions(Component::Python, now)
        .into_iter()
        .filter_map(|v| parse_version(&v).map(|parsed| (v, parsed)))
        .collect();

    if bounds.upper.is_some() {
        for (label, version) in &required {
            if bounds.excludes_by_upper(version) {
                findings.push(
                    Finding::error(
                        PYTHON,
                        format!(
                            "requires-python = \"{requires_python}\" blocks adoption of Python {label}"
                        ),
                    )
                    .with_details(format!(
                        "Python {label} must be supported within {} months of release per PHEP 3",
                        policy.adoption_months
                    ))
                    .with_suggestion(format!(
                        "Remove upper bound or update to include Python {label}"
                    )),
                );
            }
        }
    }

    for (label, version) in &required {
        for exclusion in bounds.exclusions.iter().filter(|e| same_minor(e, version)) {
            findings.push(
                Finding::error(
                    PYTHON,
                    format!(
                        "requires-python = \"{requires_python}\" excludes required Python {label}"
                    ),
                )
                .with_details(format!("Python {label} must be supported per PHEP 3"))
                .with_suggestion(format!("Remove !={exclusion} from requires-python")),
            );
        }
    }

    if let Some(exact) = bounds.exact.as_ref().filter(|_| !bounds.is_wildcard) {
        let pinned = minor_string(exact);
        for (label, version) in &required {
            if !same_minor(exact, version) {
                findings.push(
                    Finding::error(
                        PYTHON,
                        format!(
                            "requires-python = \"{requires_python}\" excludes required Python {label}"
                        ),
                    )
                    .with_details(format!(
                        "Exact pin only allows Python {pinned}, but {label} must be supported per PHEP 3"
                    ))
                    .with_suggestion("Use >= instead of == to allow newer Python versions"),
                );
            }
        }
    }

    findings
}

/// Checks one base dependency.
///
/// `supported_pythons` is the output of [`supported_python_versions`] and is
/// only used to classify `python_version` markers.
pub fn check_dependency(
    dep: &ParsedDependency,
    schedule: &Schedule,
    now: DateTime<Utc>,
    options: &CheckOptions,
    supported_pythons: &[String],
) -> Vec<Finding> {
    let context = DependencyContext::base(options, dep);
    check_dependency_in(dep, schedule, now, options, supported_pythons, context)
}

fn check_dependency_in(
    dep: &ParsedDependency,
    schedule: &Schedule,
    now: DateTime<Utc>,
    options: &CheckOptions,
    supported_pythons: &[String],
    context: DependencyContext<'_>,
) -> Vec<Finding> {
    if !options.policy.is_core_package(&dep.name) || dep.is_url {
        return Vec::new();
    }
    let Some(package) = schedule.find_package(&dep.name) else {
        tracing::debug!("{} is not tracked by the schedule", dep.name);
        return Vec::new();
    };

    let marker = python_marker_applicability(dep.markers.as_deref(), supported_pythons);
    if marker == Some(MarkerApplicability::None) {
        tracing::debug!("marker on {} excludes every supported Python", dep.raw);
        return Vec::new();
    }
    let downgrade = marker == Some(MarkerApplicability::Some);

    let bounds = extract_bounds(dep.specifier.as_deref());
    let mut findings = Vec::new();

    if let Some(finding) = upper_constraint_warning(dep, &bounds) {
        findings.push(context.tag(finding));
    }

    if let Some(lower) = &bounds.lower {
        findings.extend(check_lower_bound(
            dep, package, lower, schedule, now, options, downgrade, context,
        ));
    }

    if options.check_adoption {
        findings.extend(check_adoption(dep, package, &bounds, schedule, now, options, context));
    }

    findings
}

fn upper_constraint_warning(dep: &ParsedDependency, bounds: &VersionBounds) -> Option<Finding> {
    let raw = &dep.raw;
    if bounds.is_wildcard {
        let upper = bounds.upper.as_ref().map(ToString::to_string).unwrap_or_default();
        return Some(
            Finding::warning(&dep.name, format!("{raw} has wildcard version constraint"))
                .with_details(format!(
                    "Wildcard constraints create an implicit upper bound (<{upper})"
                ))
                .with_suggestion("Consider using >= instead for better compatibility"),
        );
    }
    if bounds.exact.is_some() {
        return Some(
            Finding::warning(&dep.name, format!("{raw} has exact version constraint"))
                .with_details("Exact constraints should only be used when absolutely necessary")
                .with_suggestion("Remove exact constraint and use >= instead"),
        );
    }
    let upper = bounds.upper.as_ref()?;
    if bounds.compatible_release {
        return Some(
            Finding::warning(&dep.name, format!("{raw} has implicit upper bound from ~="))
                .with_details(format!(
                    "The ~= operator creates an implicit upper bound (<{upper})"
                ))
                .with_suggestion("Consider using >= instead for better compatibility"),
        );
    }
    let op = if bounds.upper_inclusive { "<=" } else { "<" };
    Some(
        Finding::warning(&dep.name, format!("{raw} has upper bound constraint"))
            .with_details("Upper bounds should only be used when absolutely necessary")
            .with_suggestion(format!("Consider removing {op}{upper} unless required")),
    )
}

#[allow(clippy::too_many_arguments)]
fn check_lower_bound(
    dep: &ParsedDependency,
    package: &str,
    lower: &Version,
    schedule: &Schedule,
    now: DateTime<Utc>,
    options: &CheckOptions,
    downgrade: bool,
    context: DependencyContext<'_>,
) -> Vec<Finding> {
    let component = Component::Package(package);
    if schedule.versions(component).is_none_or(|table| table.is_empty()) {
        return Vec::new();
    }

    let name = &dep.name;
    let raw = &dep.raw;
    let floor_minor = minor_string(lower);
    let min_supported = schedule.minimum_required_version(component, now);
    let min_version = min_supported.as_deref().and_then(parse_version);
    let mut findings = Vec::new();

    if let (Some(min_supported), Some(min_version)) = (&min_supported, &min_version)
        && lower > min_version
    {
        let message = format!("{raw} drops support for {name} {min_supported} too early");
        let finding = if downgrade {
            Finding::warning(name, message)
                .with_details(format!("{name} {min_supported} should still be supported per PHEP 3"))
                .with_suggestion(format!(
                    "Drops PHEP 3 min ({min_supported}); marker allows min for some supported Pythons"
                ))
        } else {
            context.violation(
                Finding::error(name, message)
                    .with_details(format!("{name} {min_supported} must still be supported per PHEP 3"))
                    .with_suggestion(format!("Change to {name}>={min_supported}")),
            )
        };
        findings.push(context.tag(finding));
    }

    match schedule.get(component, &floor_minor) {
        Some(entry) if entry.is_droppable(now) => {
            let mut details = format!(
                "Version {floor_minor} released {} months ago (>{} months)",
                entry.months_since_release(now),
                options.policy.package_support_months
            );
            let mut finding = Finding::warning(
                name,
                format!("{name} {floor_minor} support can be dropped per PHEP 3"),
            );
            if let Some(min_supported) = &min_supported {
                details.push_str(&format!(
                    ". The minimum required version is {name}>={min_supported}"
                ));
                finding = finding
                    .with_suggestion(format!("Minimum required version: {name}>={min_supported}"));
            }
            findings.push(context.tag(finding.with_details(details)));
        }
        None => {
            if let (Some(min_supported), Some(min_version)) = (&min_supported, &min_version)
                && lower < min_version
            {
                findings.push(
                    context.tag(
                        Finding::warning(
                            name,
                            format!("{name} {floor_minor} support can be dropped per PHEP 3"),
                        )
                        .with_details(format!(
                            "Version {floor_minor} is older than the minimum required version ({name}>={min_supported})"
                        ))
                        .with_suggestion(format!(
                            "Minimum required version: {name}>={min_supported}"
                        )),
                    ),
                );
            }
        }
        Some(_) => {}
    }

    findings
}

fn check_adoption(
    dep: &ParsedDependency,
    package: &str,
    bounds: &VersionBounds,
    schedule: &Schedule,
    now: DateTime<Utc>,
    options: &CheckOptions,
    context: DependencyContext<'_>,
) -> Vec<Finding> {
    let required: Vec<(String, Version)> = schedule
        .required_versions(Component::Package(package), now)
        .into_iter()
        .filter_map(|v| parse_version(&v).map(|parsed| (v, parsed)))
        .collect();
    if required.is_empty() {
        return Vec::new();
    }

    let mut by_upper = Vec::new();
    let mut by_exact = Vec::new();
    let mut by_exclusion = Vec::new();
    let mut allowed = 0usize;

    for (label, version) in &required {
        if bounds.excludes_by_upper(version) {
            by_upper.push(label.as_str());
        } else if bounds.exact.as_ref().is_some_and(|e| !same_minor(e, version)) {
            by_exact.push(label.as_str());
        } else if bounds.matching_exclusion(version).is_some() {
            by_exclusion.push(label.as_str());
        } else {
            allowed += 1;
        }
    }

    let raw = &dep.raw;
    let name = &dep.name;
    let mut findings = Vec::new();

    for label in &by_upper {
        findings.push(context.violation(
            Finding::error(name, format!("{raw} does not support required version {label}"))
                .with_details(format!(
                    "Version {label} must be supported within {} months of release",
                    options.policy.adoption_months
                ))
                .with_suggestion(format!("Update upper bound to include {label}")),
        ));
    }

    for label in &by_exact {
        findings.push(context.violation(
            Finding::error(name, format!("{raw} does not support required version {label}"))
                .with_details(format!("Exact constraint prevents supporting {label}"))
                .with_suggestion("Remove exact constraint"),
        ));
    }

    if !by_exclusion.is_empty() && allowed == 0 {
        findings.push(context.violation(
            Finding::error(name, format!("{raw} excludes all required versions"))
                .with_details(format!(
                    "Exclusions prevent supporting any of: {}",
                    by_exclusion.join(", ")
                ))
                .with_suggestion(
                    "Remove exclusions or ensure at least one required version is allowed",
                ),
        ));
    }

    findings
}

fn parse_version(text: &str) -> Option<Version> {
    Version::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{VersionSchedule, VersionTable};
    use chrono::{Duration, TimeZone};
    use phep3_pypi::{ExtrasGroup, parse_dependency};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    /// Window relative to `now()`: support_by and drop offsets in days.
    fn window(version: &str, support_by_days: i64, drop_days: i64) -> (String, VersionSchedule) {
        let now = now();
        let support_by = now + Duration::days(support_by_days);
        (
            version.to_string(),
            VersionSchedule {
                version: version.to_string(),
                release_date: support_by - Duration::days(182),
                drop_date: now + Duration::days(drop_days),
                support_by,
            },
        )
    }

    fn schedule(python: Vec<(String, VersionSchedule)>, numpy: Vec<(String, VersionSchedule)>) -> Schedule {
        let mut packages = BTreeMap::new();
        if !numpy.is_empty() {
            packages.insert("numpy".to_string(), numpy.into_iter().collect::<VersionTable>());
        }
        Schedule {
            generated_at: now(),
            python: python.into_iter().collect(),
            packages,
        }
    }

    fn dep(raw: &str) -> ParsedDependency {
        parse_dependency(raw).unwrap()
    }

    fn errors(findings: &[Finding]) -> Vec<&Finding> {
        findings.iter().filter(|f| f.severity == Severity::Error).collect()
    }

    #[test]
    fn test_missing_requires_python() {
        let findings = check_python_version(None, &schedule(vec![], vec![]), now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "No requires-python specified");
    }

    #[test]
    fn test_unparseable_requires_python() {
        let findings = check_python_version(
            Some("<3.13"),
            &schedule(vec![], vec![]),
            now(),
            &PolicyConfig::default(),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Could not parse requires-python: <3.13");
    }

    #[test]
    fn test_python_floor_too_high() {
        let sched = schedule(vec![window("3.10", -600, 200)], vec![]);
        let findings = check_python_version(Some(">=3.13"), &sched, now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("drops support for Python 3.10 too early"));
        assert_eq!(findings[0].suggestion, "Change to requires-python = \">=3.10\"");
    }

    #[test]
    fn test_python_floor_droppable() {
        let sched = schedule(vec![window("3.9", -900, -10), window("3.10", -600, 200)], vec![]);
        let findings = check_python_version(Some(">=3.9"), &sched, now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "Python 3.9 support can be dropped per PHEP 3");
        assert!(findings[0].details.ends_with("The minimum required version is 3.10"));
    }

    #[test]
    fn test_python_floor_untracked_and_older() {
        let sched = schedule(vec![window("3.10", -600, 200)], vec![]);
        let findings = check_python_version(Some(">=3.8"), &sched, now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].details,
            "Python 3.8 is older than the minimum required version (3.10)"
        );
    }

    #[test]
    fn test_python_upper_bound_blocks_adoption() {
        let sched = schedule(vec![window("3.10", -600, 200), window("3.13", -10, 900)], vec![]);
        let findings = check_python_version(Some(">=3.10,<3.13"), &sched, now(), &PolicyConfig::default());
        assert_eq!(errors(&findings).len(), 1);
        assert!(findings[0].message.ends_with("blocks adoption of Python 3.13"));
    }

    #[test]
    fn test_python_exclusion_of_required_version() {
        let sched = schedule(vec![window("3.10", -600, 200), window("3.11", -300, 500)], vec![]);
        let findings = check_python_version(Some(">=3.10,!=3.11.*"), &sched, now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.ends_with("excludes required Python 3.11"));
        assert_eq!(findings[0].suggestion, "Remove !=3.11 from requires-python");
    }

    #[test]
    fn test_python_exact_pin() {
        let sched = schedule(vec![window("3.10", -600, 200), window("3.11", -300, 500)], vec![]);
        let findings = check_python_version(Some("==3.10"), &sched, now(), &PolicyConfig::default());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.ends_with("excludes required Python 3.11"));
        assert!(findings[0].details.starts_with("Exact pin only allows Python 3.10"));
    }

    #[test]
    fn test_python_wildcard_is_not_exact_pin() {
        let sched = schedule(vec![window("3.10", -600, 200)], vec![]);
        let findings = check_python_version(Some("==3.10.*"), &sched, now(), &PolicyConfig::default());
        assert!(errors(&findings).is_empty());
    }

    #[test]
    fn test_dependency_at_minimum_is_clean() {
        let sched = schedule(
            vec![window("3.10", -600, 200)],
            vec![window("1.24", -900, -30), window("1.25", -400, 300), window("2.0", 30, 700)],
        );
        let findings = check_dependency(&dep("numpy>=1.25"), &sched, now(), &CheckOptions::default(), &[]);
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn test_dependency_floor_too_high() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let findings = check_dependency(&dep("numpy>=2.0"), &sched, now(), &CheckOptions::default(), &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].message, "numpy>=2.0 drops support for numpy 1.25 too early");
        assert_eq!(findings[0].suggestion, "Change to numpy>=1.25");
        assert!(!findings[0].is_extras());
    }

    #[test]
    fn test_dependency_ignore_set_downgrades() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let options = CheckOptions::default().with_ignored(["NumPy"]);
        let findings = check_dependency(&dep("numpy>=2.0"), &sched, now(), &options, &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_non_core_and_url_skipped() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300)]);
        let options = CheckOptions::default();
        assert!(check_dependency(&dep("astropy>=99"), &sched, now(), &options, &[]).is_empty());
        assert!(
            check_dependency(&dep("numpy @ https://example.com/numpy.whl"), &sched, now(), &options, &[])
                .is_empty()
        );
    }

    #[test]
    fn test_untracked_core_package_skipped() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300)]);
        let findings = check_dependency(&dep("scipy>=99"), &sched, now(), &CheckOptions::default(), &[]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_upper_bound_warnings() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300)]);
        let options = CheckOptions::default();

        let cases = [
            ("numpy>=1.25,<3", "numpy>=1.25,<3 has upper bound constraint"),
            ("numpy~=1.25", "numpy~=1.25 has implicit upper bound from ~="),
            ("numpy==1.25.*", "numpy==1.25.* has wildcard version constraint"),
        ];
        for (raw, message) in cases {
            let findings = check_dependency(&dep(raw), &sched, now(), &options, &[]);
            assert_eq!(findings.len(), 1, "{raw}: {findings:?}");
            assert_eq!(findings[0].severity, Severity::Warning);
            assert_eq!(findings[0].message, message);
        }
    }

    #[test]
    fn test_exact_pin_warning_and_adoption() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let findings = check_dependency(&dep("numpy==1.25.0"), &sched, now(), &CheckOptions::default(), &[]);
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "numpy==1.25.0 has exact version constraint",
                "numpy==1.25.0 does not support required version 2.0",
            ]
        );
        assert_eq!(findings[1].severity, Severity::Error);
    }

    #[test]
    fn test_adoption_disabled() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let options = CheckOptions {
            check_adoption: false,
            ..CheckOptions::default()
        };
        let findings = check_dependency(&dep("numpy>=1.25,<2"), &sched, now(), &options, &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_exclusion_of_only_required_version() {
        let sched = schedule(vec![], vec![window("2.0", -30, 700)]);
        let findings = check_dependency(&dep("numpy!=2.0"), &sched, now(), &CheckOptions::default(), &[]);
        assert_eq!(errors(&findings).len(), 1);
        assert_eq!(findings[0].message, "numpy!=2.0 excludes all required versions");
    }

    #[test]
    fn test_partial_exclusion_tolerated() {
        let sched = schedule(vec![], vec![window("2.0", -60, 700), window("2.1", -30, 730)]);
        let findings = check_dependency(&dep("numpy!=2.0"), &sched, now(), &CheckOptions::default(), &[]);
        assert!(errors(&findings).is_empty());
    }

    #[test]
    fn test_marker_some_downgrades_lower_bound() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let supported = vec!["3.12".to_string(), "3.13".to_string(), "3.14".to_string()];
        let findings = check_dependency(
            &dep("numpy>=2.0; python_version == '3.14'"),
            &sched,
            now(),
            &CheckOptions::default(),
            &supported,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].suggestion.contains("marker allows min"));
    }

    #[test]
    fn test_marker_none_skips_dependency() {
        let sched = schedule(vec![], vec![window("1.25", -400, 300), window("2.0", -30, 700)]);
        let supported = vec!["3.12".to_string(), "3.13".to_string()];
        let findings = check_dependency(
            &dep("numpy>=2.0,<2.1; python_version < '3.10'"),
            &sched,
            now(),
            &CheckOptions::default(),
            &supported,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_supported_python_versions_filters_by_requires_python() {
        let sched = schedule(
            vec![window("3.10", -600, 200), window("3.11", -300, 500), window("3.9", -900, -5)],
            vec![],
        );
        assert_eq!(
            supported_python_versions(Some(">=3.11"), &sched, now()),
            vec!["3.11"]
        );
        assert_eq!(
            supported_python_versions(None, &sched, now()),
            vec!["3.10", "3.11"]
        );
        assert_eq!(
            supported_python_versions(Some("not a spec"), &sched, now()),
            vec!["3.10", "3.11"]
        );
    }

    #[test]
    fn test_extras_findings_are_warnings_with_context() {
        let sched = schedule(
            vec![window("3.10", -600, 200)],
            vec![window("1.25", -400, 300), window("2.0", -30, 700)],
        );
        let project = ProjectMetadata {
            requires_python: Some(">=3.10".into()),
            dependencies: vec![dep("numpy>=1.25")],
            optional_dependencies: vec![ExtrasGroup {
                name: "dev".into(),
                dependencies: vec![dep("numpy>=2.0")],
            }],
            ..ProjectMetadata::default()
        };

        let findings = check_compliance(&project, &sched, now(), &CheckOptions::default());
        assert!(passes(&findings, false));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].context, "dev");
        assert!(!passes(&findings, true));
    }

    #[test]
    fn test_compliance_is_deterministic() {
        let sched = schedule(
            vec![window("3.10", -600, 200), window("3.11", -300, 500)],
            vec![window("1.25", -400, 300), window("2.0", -30, 700)],
        );
        let project = ProjectMetadata {
            requires_python: Some(">=3.11,!=3.11.2".into()),
            dependencies: vec![dep("numpy>=2.0,<2.1"), dep("scipy")],
            ..ProjectMetadata::default()
        };
        let options = CheckOptions::default();

        let first = check_compliance(&project, &sched, now(), &options);
        let second = check_compliance(&project, &sched, now(), &options);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
