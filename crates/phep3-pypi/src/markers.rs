//! Python-version marker evaluation.
//!
//! A dependency such as `numpy>=2.1; python_version >= "3.13"` only applies
//! under some interpreters. The policy engine needs to know whether the
//! marker holds for all, some, or none of the interpreters a project still
//! supports.

use pep508_rs::{MarkerEnvironment, MarkerEnvironmentBuilder, MarkerTree};
use std::str::FromStr;

/// How a marker relates to the set of supported Python versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerApplicability {
    /// Holds under every supported Python
    All,
    /// Holds under some but not all
    Some,
    /// Holds under none
    None,
}

/// Classifies `markers` against `supported_versions` (`major.minor` strings).
///
/// Returns `None` when there is nothing to classify: no markers, markers
/// that do not mention `python_version`/`python_full_version`, markers that
/// fail to parse, or an empty version list.
///
/// # Examples
///
/// ```
/// use phep3_pypi::markers::{MarkerApplicability, python_marker_applicability};
///
/// let supported = vec!["3.12".to_string(), "3.13".to_string(), "3.14".to_string()];
///
/// assert_eq!(
///     python_marker_applicability(Some("python_version == '3.14'"), &supported),
///     Some(MarkerApplicability::Some)
/// );
/// assert_eq!(
///     python_marker_applicability(Some("sys_platform == 'linux'"), &supported),
///     None
/// );
/// ```
pub fn python_marker_applicability(
    markers: Option<&str>,
    supported_versions: &[String],
) -> Option<MarkerApplicability> {
    let markers = markers?.trim();
    if markers.is_empty() || supported_versions.is_empty() {
        return None;
    }
    if !markers.contains("python_version") && !markers.contains("python_full_version") {
        return None;
    }

    let tree = match MarkerTree::from_str(markers) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::debug!("ignoring unparseable marker '{}': {}", markers, e);
            return None;
        }
    };

    let mut matched = 0usize;
    let mut evaluated = 0usize;
    for version in supported_versions {
        let Some(env) = python_environment(version) else {
            continue;
        };
        evaluated += 1;
        if tree.evaluate(&env, &[]) {
            matched += 1;
        }
    }

    if evaluated == 0 {
        return None;
    }
    Some(if matched == evaluated {
        MarkerApplicability::All
    } else if matched > 0 {
        MarkerApplicability::Some
    } else {
        MarkerApplicability::None
    })
}

/// Marker environment of a CPython interpreter at `version`.0 on Linux.
fn python_environment(version: &str) -> Option<MarkerEnvironment> {
    let full_version = format!("{version}.0");
    let builder = MarkerEnvironmentBuilder {
        implementation_name: "cpython",
        implementation_version: &full_version,
        os_name: "posix",
        platform_machine: "x86_64",
        platform_python_implementation: "CPython",
        platform_release: "",
        platform_system: "Linux",
        platform_version: "",
        python_full_version: &full_version,
        python_version: version,
        sys_platform: "linux",
    };
    match MarkerEnvironment::try_from(builder) {
        Ok(env) => Some(env),
        Err(e) => {
            tracing::debug!("cannot build marker environment for Python {}: {}", version, e);
            None
        }
    }
}
