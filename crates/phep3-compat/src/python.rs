//! Python interpreter pre-check against the reference environment.

use crate::conflict::Conflict;
use pep440_rs::{Version, VersionSpecifiers};
use phep3_core::Finding;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static ENV_PYTHON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*::)?python[<>=!]*=?(\d+\.\d+(?:\.\d+)?)")
        .expect("environment python pattern must compile")
});

/// Checks that the environment's interpreter satisfies `requires-python`.
///
/// Returns `None` when compatible, and also when either input is missing or
/// unparseable; resolution will surface those cases on its own.
///
/// # Examples
///
/// ```
/// use phep3_compat::check_python_compatibility;
///
/// assert!(check_python_compatibility(Some(">=3.11"), "3.12.9").is_none());
///
/// let conflict = check_python_compatibility(Some(">=3.13"), "3.12.9").unwrap();
/// assert_eq!(conflict.package, "python");
/// assert_eq!(conflict.pyhc_requirement, "Python 3.12.9");
/// ```
pub fn check_python_compatibility(
    requires_python: Option<&str>,
    env_python: &str,
) -> Option<Conflict> {
    let requires_python = requires_python.map(str::trim).filter(|s| !s.is_empty())?;
    let specifiers = match VersionSpecifiers::from_str(requires_python) {
        Ok(specifiers) => specifiers,
        Err(e) => {
            tracing::debug!("skipping Python pre-check, bad requires-python: {}", e);
            return None;
        }
    };
    let version = match Version::from_str(env_python.trim()) {
        Ok(version) => version,
        Err(e) => {
            tracing::debug!("skipping Python pre-check, bad environment version: {}", e);
            return None;
        }
    };

    if specifiers.contains(&version) {
        return None;
    }

    Some(Conflict::new(
        "python",
        format!("Python {requires_python}"),
        format!("Python {env_python}"),
        format!(
            "Your package requires: Python {requires_python}\n\
             PyHC Environment uses: Python {env_python}\n\
             Your package cannot be installed in the PyHC Environment."
        ),
    ))
}

pub fn python_conflict_finding(conflict: &Conflict) -> Finding {
    Finding::error("python", "Python version incompatible with PyHC Environment")
        .with_details(&conflict.reason)
        .with_suggestion(format!(
            "Allow {} in requires-python",
            conflict.pyhc_requirement
        ))
}

/// Extracts the interpreter version from a conda `environment.yml`.
///
/// Understands `python=3.12.9`, `python>=3.12`, and channel-qualified pins
/// with build strings such as `conda-forge::python=3.12.9=h9e4cc4f_0_cpython`.
pub fn python_version_from_environment(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("- "))
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|item| item.starts_with("python") || item.contains("::python"))
        .find_map(|item| ENV_PYTHON.captures(item).map(|c| c[1].to_string()))
}
