use serde::{Deserialize, Serialize};

/// A dependency declaration from pyproject.toml or a requirements file.
///
/// `raw` keeps the declaration exactly as written (trimmed), since findings
/// quote it back to the user. `name` is the PEP 503 normalized name.
///
/// # Examples
///
/// ```
/// use phep3_pypi::parser::parse_dependency;
///
/// let dep = parse_dependency("NumPy>=1.26; python_version >= '3.10'").unwrap();
/// assert_eq!(dep.name, "numpy");
/// assert_eq!(dep.specifier.as_deref(), Some(">=1.26"));
/// assert_eq!(dep.markers.as_deref(), Some("python_version >= '3.10'"));
/// assert_eq!(dep.raw, "NumPy>=1.26; python_version >= '3.10'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDependency {
    /// Package name, normalized
    pub name: String,
    /// PEP 440 specifier (e.g. ">=1.26,<3"), absent when unconstrained
    pub specifier: Option<String>,
    /// PEP 508 extras requested from the dependency
    pub extras: Vec<String>,
    /// Environment marker expression (text after `;`)
    pub markers: Option<String>,
    /// Direct URL or VCS reference
    pub is_url: bool,
    pub raw: String,
}

/// One `[project.optional-dependencies]` group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtrasGroup {
    pub name: String,
    pub dependencies: Vec<ParsedDependency>,
}

/// The parts of a `[project]` table the checks consume.
///
/// Extras groups keep their file order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: Option<String>,
    pub requires_python: Option<String>,
    pub dependencies: Vec<ParsedDependency>,
    pub optional_dependencies: Vec<ExtrasGroup>,
}

impl ProjectMetadata {
    pub fn extras_names(&self) -> impl Iterator<Item = &str> {
        self.optional_dependencies.iter().map(|g| g.name.as_str())
    }
}

/// Normalizes a package name per PEP 503.
///
/// Lowercases and collapses runs of `-`, `_` and `.` into a single `-`.
///
/// # Examples
///
/// ```
/// # use phep3_pypi::types::normalize_package_name;
/// assert_eq!(normalize_package_name("Scikit_Image"), "scikit-image");
/// assert_eq!(normalize_package_name("zope.interface"), "zope-interface");
/// assert_eq!(normalize_package_name("my__package"), "my-package");
/// ```
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .replace(&['_', '.'][..], "-")
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
