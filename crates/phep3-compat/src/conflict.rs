//! Interpreter for `uv` resolution failures.
//!
//! The solver explains unsatisfiable requirement sets in English sentences
//! with no machine-readable form. [`parse_solver_error`] runs an ordered list
//! of pattern families over that text, each tuned to one phrasing:
//!
//! 1. `Because A requires x<1 and B requires x>=1`
//! 2. `A depends on x<1 and B depends on x>=1`
//! 3. `A depends on x<1 and you require x>=1` (and the reverse)
//! 4. `only x<1 is available and B depends on x>=1` (and the `you require` form)
//! 5. `there is no version of x==1 and you require x==1`
//! 6. `... x<1 ... x>=1 are incompatible`
//!
//! A match only counts when both sides name the same package and the
//! specifiers still differ after normalization. The first conflict found for
//! a package wins, scanning families in the order above.

use phep3_pypi::normalize_package_name;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Marker uv prints when resolution is impossible.
pub const NO_SOLUTION_MARKER: &str = "No solution found";

const NAME: &str = r"[A-Za-z0-9][A-Za-z0-9._-]*";
const SPEC: &str = r"(?:\[[^\]\s]*\])?[<>=!~][^\s]*";
const LABEL: &str = r"(?:your\s+)?\S+";

/// One incompatibility between the checked package and the reference environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub package: String,
    pub your_requirement: String,
    pub pyhc_requirement: String,
    pub reason: String,
}

impl Conflict {
    pub fn new(
        package: impl Into<String>,
        your_requirement: impl Into<String>,
        pyhc_requirement: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            your_requirement: your_requirement.into(),
            pyhc_requirement: pyhc_requirement.into(),
            reason: reason.into(),
        }
    }
}

type Extractor = fn(&Captures<'_>, Option<&str>) -> Option<Conflict>;

struct ConflictPattern {
    name: &'static str,
    regex: Regex,
    extract: Extractor,
}

impl ConflictPattern {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("conflict pattern must compile"),
            extract,
        }
    }
}

/// Pattern families in precedence order.
static PATTERNS: LazyLock<Vec<ConflictPattern>> = LazyLock::new(|| {
    vec![
        ConflictPattern::new(
            "requires/requires",
            &format!(
                r"(?i)\bbecause\s+(?P<src1>{LABEL})\s+requires\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+and\s+(?P<src2>{LABEL})\s+requires\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_symmetric,
        ),
        ConflictPattern::new(
            "depends/depends",
            &format!(
                r"(?i)(?P<src1>{LABEL})\s+depends\s+on\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+and\s+(?P<src2>{LABEL})\s+depends\s+on\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_symmetric,
        ),
        ConflictPattern::new(
            "depends/you-require",
            &format!(
                r"(?i)(?P<src1>{LABEL})\s+depends\s+on\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+and\s+(?P<src2>you)\s+requires?\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_you_require,
        ),
        ConflictPattern::new(
            "you-require/depends",
            &format!(
                r"(?i)\b(?P<src1>you)\s+requires?\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+and\s+(?P<src2>{LABEL})\s+depends\s+on\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_you_require,
        ),
        ConflictPattern::new(
            "only-available/depends",
            &format!(
                r"(?i)\bonly\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+is\s+available\s+and\s+(?P<src2>{LABEL})\s+depends\s+on\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_only_available,
        ),
        ConflictPattern::new(
            "only-available/you-require",
            &format!(
                r"(?i)\bonly\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+is\s+available\s+and\s+(?P<src2>you)\s+requires?\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_only_available,
        ),
        ConflictPattern::new(
            "no-version",
            &format!(
                r"(?i)\bthere\s+is\s+no\s+version\s+of\s+(?P<pkg1>{NAME})(?P<spec1>{SPEC})\s+and\s+you\s+requires?\s+(?P<pkg2>{NAME})(?P<spec2>{SPEC})"
            ),
            extract_no_version,
        ),
        ConflictPattern::new(
            "are-incompatible",
            &format!(
                r"(?i)(?P<pkg1>{NAME})(?P<spec1>{SPEC})[ \t]+(?:\S+[ \t]+)*?(?P<pkg2>{NAME})(?P<spec2>{SPEC})[ \t]+are[ \t]+incompatible"
            ),
            extract_incompatible_trailer,
        ),
    ]
});

static FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:depends\s+on|requires?)\s+(?P<pkg>{NAME})(?:\{{[^}}]*\}})?(?P<spec>{SPEC})"
    ))
    .expect("fragment pattern must compile")
});

/// Extracts conflicts from uv's stderr.
///
/// `own_package` is the name of the package being checked; it only changes
/// how availability-limited conflicts are worded.
///
/// Text that matches no pattern but contains [`NO_SOLUTION_MARKER`] still
/// yields at least one conflict: either the best-effort fallback from
/// [`extract_fallback_conflict`] or a catch-all carrying the cleaned text.
/// Anything else yields an empty list.
///
/// # Examples
///
/// ```
/// use phep3_compat::parse_solver_error;
///
/// let stderr = "Because pyhc-core==0.0.7 depends on numpy<2 and you require numpy>=2.0,<2.3.0, \
///               we can conclude that your requirements are unsatisfiable.";
/// let conflicts = parse_solver_error(stderr, None);
///
/// assert_eq!(conflicts.len(), 1);
/// assert_eq!(conflicts[0].package, "numpy");
/// assert_eq!(conflicts[0].your_requirement, "numpy<2");
/// assert_eq!(conflicts[0].pyhc_requirement, "numpy>=2.0,<2.3.0");
/// ```
pub fn parse_solver_error(stderr: &str, own_package: Option<&str>) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let mut seen = HashSet::new();

    for pattern in PATTERNS.iter() {
        for captures in pattern.regex.captures_iter(stderr) {
            let Some(conflict) = (pattern.extract)(&captures, own_package) else {
                continue;
            };
            if seen.insert(normalize_package_name(&conflict.package)) {
                tracing::debug!("{} pattern matched conflict on {}", pattern.name, conflict.package);
                conflicts.push(conflict);
            }
        }
    }

    if conflicts.is_empty() && stderr.contains(NO_SOLUTION_MARKER) {
        let fallback = extract_fallback_conflict(stderr).unwrap_or_else(|| {
            tracing::debug!("no conflict pattern matched, reporting raw solver output");
            Conflict::new(
                "dependencies",
                "(see error details)",
                "PyHC Environment",
                error_summary(stderr),
            )
        });
        conflicts.push(fallback);
    }

    conflicts
}

/// Best-effort extraction for solver text no pattern family understood.
///
/// Collects every `depends on X<spec>` / `requires X<spec>` fragment, groups
/// them by package and reports the first package that appears with at least
/// two distinct specifiers. A `{marker}` between name and specifier is dropped.
pub fn extract_fallback_conflict(stderr: &str) -> Option<Conflict> {
    let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();

    for captures in FRAGMENT.captures_iter(stderr) {
        let package = &captures["pkg"];
        let spec = clean_spec(&captures["spec"]);
        let key = normalize_package_name(package);
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, specs)) => {
                if !specs.iter().any(|s| normalize_spec(s) == normalize_spec(&spec)) {
                    specs.push(spec);
                }
            }
            None => groups.push((key, package.to_string(), vec![spec])),
        }
    }

    groups
        .into_iter()
        .find(|(_, _, specs)| specs.len() >= 2)
        .map(|(_, package, specs)| {
            Conflict::new(
                package.clone(),
                format!("{package}{}", specs[0]),
                format!("{package}{}", specs[1]),
                format!("Conflicting requirements found for {package}"),
            )
        })
}

/// Multi-line summary of solver output with hints and box drawing removed.
pub fn error_summary(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("hint:"))
        .map(|line| {
            line.replace("╰─▶", "→")
                .replace("├─▶", "→")
                .replace(['×', '│'], "")
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_symmetric(captures: &Captures<'_>, _own: Option<&str>) -> Option<Conflict> {
    let (pkg, spec1, spec2) = matched_pair(captures)?;
    let src1 = &captures["src1"];
    let src2 = &captures["src2"];

    let (yours, theirs) = if has_you_token(src2) && !has_you_token(src1) {
        (spec2, spec1)
    } else {
        (spec1, spec2)
    };

    Some(Conflict::new(
        pkg,
        format!("{pkg}{yours}"),
        format!("{pkg}{theirs}"),
        format!("Incompatible requirements from {src1} and {src2}"),
    ))
}

fn extract_you_require(captures: &Captures<'_>, _own: Option<&str>) -> Option<Conflict> {
    let (pkg, spec1, spec2) = matched_pair(captures)?;
    let src1 = &captures["src1"];
    let src2 = &captures["src2"];

    let (dependent, yours, theirs) = if has_you_token(src2) {
        (src1, spec1, spec2)
    } else {
        (src2, spec2, spec1)
    };

    Some(Conflict::new(
        pkg,
        format!("{pkg}{yours}"),
        format!("{pkg}{theirs}"),
        format!("{dependent} requires {pkg}{yours}, but the combined requirements need {pkg}{theirs}"),
    ))
}

fn extract_only_available(captures: &Captures<'_>, own: Option<&str>) -> Option<Conflict> {
    let (pkg, available, required) = matched_pair(captures)?;
    let dependent = &captures["src2"];

    let reason = match own {
        Some(own) if normalize_package_name(own) == normalize_package_name(pkg) => format!(
            "Your local {pkg} ({pkg}{available}) is too old for {dependent}, which requires {pkg}{required}"
        ),
        _ => format!("Only {pkg}{available} is available, but {dependent} requires {pkg}{required}"),
    };

    Some(Conflict::new(
        pkg,
        format!("{pkg}{available}"),
        format!("{pkg}{required}"),
        reason,
    ))
}

fn extract_no_version(captures: &Captures<'_>, _own: Option<&str>) -> Option<Conflict> {
    let pkg1 = &captures["pkg1"];
    let pkg2 = &captures["pkg2"];
    if normalize_package_name(pkg1) != normalize_package_name(pkg2) {
        return None;
    }
    let requirement = format!("{pkg2}{}", clean_spec(&captures["spec2"]));
    Some(Conflict::new(
        pkg2,
        "(not specified)",
        requirement.clone(),
        format!("No matching distribution found for {requirement}"),
    ))
}

fn extract_incompatible_trailer(captures: &Captures<'_>, _own: Option<&str>) -> Option<Conflict> {
    let (pkg, spec1, spec2) = matched_pair(captures)?;
    Some(Conflict::new(
        pkg,
        format!("{pkg}{spec1}"),
        format!("{pkg}{spec2}"),
        "Version requirements are incompatible",
    ))
}

/// Returns `(package, spec1, spec2)` when both sides name the same package
/// with specifiers that still differ after normalization.
fn matched_pair<'t>(captures: &'t Captures<'_>) -> Option<(&'t str, String, String)> {
    let pkg1 = captures.name("pkg1")?.as_str();
    let pkg2 = captures.name("pkg2")?.as_str();
    if normalize_package_name(pkg1) != normalize_package_name(pkg2) {
        return None;
    }
    let spec1 = clean_spec(captures.name("spec1")?.as_str());
    let spec2 = clean_spec(captures.name("spec2")?.as_str());
    if normalize_spec(&spec1) == normalize_spec(&spec2) {
        return None;
    }
    Some((pkg1, spec1, spec2))
}

fn has_you_token(label: &str) -> bool {
    label
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("you") || word.eq_ignore_ascii_case("your"))
}

fn clean_spec(spec: &str) -> String {
    spec.trim()
        .trim_end_matches([',', '.', ';'])
        .to_string()
}

/// Specifier with surrounding noise and a leading extras bracket removed.
fn normalize_spec(spec: &str) -> String {
    let spec = clean_spec(spec);
    let spec = match spec.strip_prefix('[') {
        Some(rest) => rest.split_once(']').map_or(rest, |(_, tail)| tail),
        None => spec.as_str(),
    };
    spec.replace(' ', "")
}
