use crate::error::{PypiError, Result};
use crate::types::{ExtrasGroup, ParsedDependency, ProjectMetadata, normalize_package_name};
use pep508_rs::{Requirement, VersionOrUrl};
use std::path::Path;
use toml_edit::{DocumentMut, Table};

/// Parses a single PEP 508 requirement string.
///
/// Returns `None` for blank input and for strings the PEP 508 grammar
/// rejects; the latter are logged and skipped rather than failing the check.
///
/// # Examples
///
/// ```
/// use phep3_pypi::parser::parse_dependency;
///
/// let dep = parse_dependency("xarray[io]>=2023.1").unwrap();
/// assert_eq!(dep.extras, vec!["io"]);
/// assert!(!dep.is_url);
///
/// assert!(parse_dependency("   ").is_none());
/// ```
pub fn parse_dependency(raw: &str) -> Option<ParsedDependency> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match try_parse_dependency(raw) {
        Ok(dep) => Some(dep),
        Err(e) => {
            tracing::warn!("Failed to parse dependency '{}': {}", raw, e);
            None
        }
    }
}

fn try_parse_dependency(raw: &str) -> Result<ParsedDependency> {
    let requirement: Requirement = raw
        .parse()
        .map_err(|e| PypiError::invalid_requirement(raw, e))?;

    let (specifier, is_url) = match &requirement.version_or_url {
        Some(VersionOrUrl::VersionSpecifier(specs)) => {
            let text = specs.to_string();
            (if text.is_empty() { None } else { Some(text) }, false)
        }
        Some(VersionOrUrl::Url(_)) => (None, true),
        None => (None, false),
    };

    let markers = raw
        .split_once(';')
        .map(|(_, m)| m.trim().to_string())
        .filter(|m| !m.is_empty());

    Ok(ParsedDependency {
        name: normalize_package_name(&requirement.name.to_string()),
        specifier,
        extras: requirement.extras.iter().map(ToString::to_string).collect(),
        markers,
        is_url,
        raw: raw.to_string(),
    })
}

/// Parses pyproject.toml content into [`ProjectMetadata`].
///
/// Only the PEP 621 `[project]` table is read. A missing table yields empty
/// metadata; malformed TOML is an error.
///
/// # Examples
///
/// ```
/// use phep3_pypi::parser::parse_pyproject;
///
/// let content = r#"
/// [project]
/// name = "sunpy"
/// requires-python = ">=3.11"
/// dependencies = ["numpy>=1.25", "astropy>=6.0"]
///
/// [project.optional-dependencies]
/// image = ["scikit-image>=0.21"]
/// "#;
///
/// let metadata = parse_pyproject(content).unwrap();
/// assert_eq!(metadata.requires_python.as_deref(), Some(">=3.11"));
/// assert_eq!(metadata.dependencies.len(), 2);
/// assert_eq!(metadata.optional_dependencies[0].name, "image");
/// ```
pub fn parse_pyproject(content: &str) -> Result<ProjectMetadata> {
    let doc = content
        .parse::<DocumentMut>()
        .map_err(|e| PypiError::TomlParseError { source: e })?;

    let Some(project_item) = doc.get("project") else {
        tracing::debug!("no [project] table in pyproject.toml");
        return Ok(ProjectMetadata::default());
    };
    let Some(project) = project_item.as_table() else {
        return Err(PypiError::InvalidStructure {
            message: "[project] is not a table".into(),
        });
    };

    Ok(ProjectMetadata {
        name: string_field(project, "name"),
        requires_python: string_field(project, "requires-python"),
        dependencies: parse_dependency_array(project, "dependencies"),
        optional_dependencies: parse_optional_dependencies(project),
    })
}

/// Reads and parses a pyproject.toml file.
pub fn parse_pyproject_file(path: &Path) -> Result<ProjectMetadata> {
    let content = std::fs::read_to_string(path)?;
    parse_pyproject(&content)
}

fn string_field(table: &Table, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(|item| item.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_dependency_array(table: &Table, key: &str) -> Vec<ParsedDependency> {
    let Some(array) = table.get(key).and_then(|item| item.as_array()) else {
        return Vec::new();
    };

    array
        .iter()
        .filter_map(|value| value.as_str())
        .filter_map(parse_dependency)
        .collect()
}

fn parse_optional_dependencies(project: &Table) -> Vec<ExtrasGroup> {
    let Some(groups) = project
        .get("optional-dependencies")
        .and_then(|item| item.as_table_like())
    else {
        return Vec::new();
    };

    groups
        .iter()
        .map(|(name, item)| {
            let dependencies = item
                .as_array()
                .map(|array| {
                    array
                        .iter()
                        .filter_map(|value| value.as_str())
                        .filter_map(parse_dependency)
                        .collect()
                })
                .unwrap_or_default();
            ExtrasGroup {
                name: name.to_string(),
                dependencies,
            }
        })
        .collect()
}

/// Returns the requirement lines of a requirements-style text.
///
/// Blank lines, `#` comments, pip options (`-r`, `-e`, `--index-url`, ...)
/// and local paths starting with `.` or `/` are dropped.
///
/// # Examples
///
/// ```
/// use phep3_pypi::parser::parse_package_specs;
///
/// let text = "# pinned\nnumpy==2.2.6\n-r base.txt\n./local-pkg\n\nsunpy[all]==7.0.1\n";
/// assert_eq!(parse_package_specs(text), vec!["numpy==2.2.6", "sunpy[all]==7.0.1"]);
/// ```
pub fn parse_package_specs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#'))
        .filter(|line| !line.starts_with('-'))
        .filter(|line| !line.starts_with('.') && !line.starts_with('/'))
        .map(ToString::to_string)
        .collect()
}
