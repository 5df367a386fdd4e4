//! Normalized lower/upper bounds of a PEP 440 specifier.
//!
//! [`extract_bounds`] folds every clause of a specifier such as
//! `>=1.26,<3,!=2.0.*` into one [`VersionBounds`] value. The policy engine
//! only ever asks interval questions of it: what is the floor, what is the
//! ceiling, is the range pinned, which minors are excluded.

use pep440_rs::{Operator, Version, VersionSpecifier};
use std::str::FromStr;

/// Lower/upper/exact/exclusion summary of a version specifier.
///
/// `lower_inclusive` and `upper_inclusive` default to `true`; they only carry
/// meaning when the matching bound is set. `has_upper_constraint` is true iff
/// an upper bound, an exact pin, or a wildcard pin is present.
///
/// # Examples
///
/// ```
/// use phep3_pypi::bounds::extract_bounds;
///
/// let bounds = extract_bounds(Some("~=1.26"));
/// assert_eq!(bounds.lower.unwrap().to_string(), "1.26");
/// assert_eq!(bounds.upper.unwrap().to_string(), "2.0.0");
/// assert!(!bounds.upper_inclusive);
/// assert!(bounds.compatible_release);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBounds {
    pub lower: Option<Version>,
    pub lower_inclusive: bool,
    pub upper: Option<Version>,
    pub upper_inclusive: bool,
    pub exact: Option<Version>,
    pub exclusions: Vec<Version>,
    pub is_wildcard: bool,
    pub has_upper_constraint: bool,
    /// Set when a `~=` clause is part of the specifier.
    pub compatible_release: bool,
}

impl Default for VersionBounds {
    fn default() -> Self {
        Self {
            lower: None,
            lower_inclusive: true,
            upper: None,
            upper_inclusive: true,
            exact: None,
            exclusions: Vec::new(),
            is_wildcard: false,
            has_upper_constraint: false,
            compatible_release: false,
        }
    }
}

impl VersionBounds {
    /// Returns true when `version` lies above the upper bound.
    pub fn excludes_by_upper(&self, version: &Version) -> bool {
        match &self.upper {
            Some(upper) if self.upper_inclusive => version > upper,
            Some(upper) => version >= upper,
            None => false,
        }
    }

    /// Returns the first `!=` exclusion sharing `version`'s major.minor.
    pub fn matching_exclusion(&self, version: &Version) -> Option<&Version> {
        self.exclusions.iter().find(|e| same_minor(e, version))
    }

    fn raise_lower(&mut self, version: &Version, inclusive: bool) {
        let replace = match &self.lower {
            None => true,
            Some(current) if inclusive => version > current,
            Some(current) => version >= current,
        };
        if replace {
            self.lower = Some(version.clone());
            self.lower_inclusive = inclusive;
        }
    }

    fn lower_upper(&mut self, version: Version, inclusive: bool) {
        let replace = match &self.upper {
            None => true,
            Some(current) if inclusive => &version < current,
            Some(current) => &version <= current,
        };
        if replace {
            self.upper = Some(version);
            self.upper_inclusive = inclusive;
        }
        self.has_upper_constraint = true;
    }
}

/// Builds bounds from a comma-separated specifier string.
///
/// Clauses that fail to parse are skipped. `None` and empty strings yield
/// [`VersionBounds::default`], which callers must read as "no constraint".
pub fn extract_bounds(specifier: Option<&str>) -> VersionBounds {
    let mut bounds = VersionBounds::default();
    let Some(specifier) = specifier else {
        return bounds;
    };

    for clause in specifier.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        match VersionSpecifier::from_str(clause) {
            Ok(spec) => apply_clause(&mut bounds, &spec),
            Err(e) => {
                tracing::debug!("skipping unparseable specifier clause '{}': {}", clause, e);
            }
        }
    }

    bounds
}

fn apply_clause(bounds: &mut VersionBounds, spec: &VersionSpecifier) {
    let version = spec.version();
    match spec.operator() {
        Operator::GreaterThanEqual => bounds.raise_lower(version, true),
        Operator::GreaterThan => bounds.raise_lower(version, false),
        Operator::LessThanEqual => bounds.lower_upper(version.clone(), true),
        Operator::LessThan => bounds.lower_upper(version.clone(), false),
        Operator::EqualStar => {
            bounds.is_wildcard = true;
            bounds.raise_lower(&append_zero(version.release()), true);
            bounds.lower_upper(wildcard_upper(version.release()), false);
        }
        Operator::Equal | Operator::ExactEqual => {
            bounds.exact = Some(version.clone());
            bounds.has_upper_constraint = true;
        }
        Operator::NotEqual | Operator::NotEqualStar => {
            bounds.exclusions.push(version.clone());
        }
        Operator::TildeEqual => {
            bounds.compatible_release = true;
            bounds.raise_lower(version, true);
            bounds.lower_upper(compatible_upper(version.release()), false);
        }
    }
}

fn append_zero(release: &[u64]) -> Version {
    Version::new(release.iter().copied().chain(std::iter::once(0)))
}

/// `==1.26.*` caps at `1.27.0`, `==1.*` at `2.0`.
fn wildcard_upper(release: &[u64]) -> Version {
    let mut bumped = release.to_vec();
    if let Some(last) = bumped.last_mut() {
        *last = last.saturating_add(1);
    }
    append_zero(&bumped)
}

/// `~=1.26` caps at `2.0.0`; `~=1.26.1` caps at `1.27.0`.
fn compatible_upper(release: &[u64]) -> Version {
    if release.len() <= 2 {
        let major = release.first().copied().unwrap_or(0);
        return Version::new([major.saturating_add(1), 0, 0]);
    }
    let mut bumped = release.to_vec();
    let len = bumped.len();
    bumped[len - 2] = bumped[len - 2].saturating_add(1);
    bumped[len - 1] = 0;
    Version::new(bumped)
}

/// First two release segments, missing ones read as zero.
pub fn major_minor(version: &Version) -> (u64, u64) {
    let release = version.release();
    (
        release.first().copied().unwrap_or(0),
        release.get(1).copied().unwrap_or(0),
    )
}

/// Formats a version truncated to `major.minor`.
pub fn minor_string(version: &Version) -> String {
    let (major, minor) = major_minor(version);
    format!("{major}.{minor}")
}

pub fn same_minor(a: &Version, b: &Version) -> bool {
    major_minor(a) == major_minor(b)
}
