//! Resolution groups: base dependencies plus selected extras.

use phep3_core::{Finding, Severity};
use phep3_pypi::normalize_package_name;
use std::convert::Infallible;
use std::path::Path;
use std::str::FromStr;

/// Which extras groups get their own resolution run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtrasSelection {
    /// Every declared group, with `all` moved last.
    #[default]
    Auto,
    /// Base dependencies only.
    None,
    /// An explicit list.
    List(Vec<String>),
}

impl FromStr for ExtrasSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_lowercase().as_str() {
            "" | "auto" => Self::Auto,
            "none" | "base" | "no" => Self::None,
            _ => Self::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            ),
        })
    }
}

/// Extras to check, in run order, plus requested names that do not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtrasPlan {
    pub extras: Vec<String>,
    pub unknown: Vec<String>,
}

impl ExtrasPlan {
    /// The configuration error for unknown extras, if any.
    pub fn unknown_finding(&self) -> Option<Finding> {
        if self.unknown.is_empty() {
            return None;
        }
        let mut unknown = self.unknown.clone();
        unknown.sort();
        Some(
            Finding::error("extras", "Unknown extras requested")
                .with_details(unknown.join(", "))
                .with_suggestion("Check [project.optional-dependencies] names")
                .with_context("config"),
        )
    }
}

pub fn plan_extras<S: AsRef<str>>(selection: &ExtrasSelection, available: &[S]) -> ExtrasPlan {
    let available: Vec<&str> = available.iter().map(AsRef::as_ref).collect();
    match selection {
        ExtrasSelection::None => ExtrasPlan::default(),
        ExtrasSelection::Auto => {
            let mut extras: Vec<String> = available
                .iter()
                .filter(|e| **e != "all")
                .map(ToString::to_string)
                .collect();
            if available.contains(&"all") {
                extras.push("all".to_string());
            }
            ExtrasPlan {
                extras,
                unknown: Vec::new(),
            }
        }
        ExtrasSelection::List(requested) => {
            let (extras, unknown) = requested
                .iter()
                .cloned()
                .partition(|e| available.contains(&e.as_str()));
            ExtrasPlan { extras, unknown }
        }
    }
}

/// Drops reference entries naming `own_package`, whatever their extras or pins.
pub fn exclude_package(specs: &[String], own_package: &str) -> Vec<String> {
    let own = normalize_package_name(own_package);
    specs
        .iter()
        .filter(|spec| normalize_package_name(requirement_name(spec)) != own)
        .cloned()
        .collect()
}

fn requirement_name(spec: &str) -> &str {
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    &spec[..end]
}

/// One `uv pip compile` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Extras group, `None` for the base dependencies.
    pub extra: Option<String>,
    pub requirements: Vec<String>,
    pub constraints: Vec<String>,
    /// Interpreter version to resolve for; truncated to `major.minor` on use.
    pub python_version: Option<String>,
}

impl ResolveRequest {
    /// Reference packages plus the project directory, optionally with one extra.
    pub fn for_project(
        project_dir: &Path,
        extra: Option<&str>,
        reference: &[String],
        constraints: &[String],
        python_version: Option<&str>,
    ) -> Self {
        let mut requirements = reference.to_vec();
        let dir = project_dir.display();
        requirements.push(match extra {
            Some(extra) => format!("{dir}[{extra}]"),
            None => dir.to_string(),
        });

        Self {
            extra: extra.map(ToString::to_string),
            requirements,
            constraints: constraints.to_vec(),
            python_version: python_version.map(ToString::to_string),
        }
    }

    /// Finding context: the extras group name, or `base`.
    pub fn context(&self) -> &str {
        self.extra.as_deref().unwrap_or(phep3_core::BASE_CONTEXT)
    }

    /// Extras problems never fail the run.
    pub fn severity(&self) -> Severity {
        if self.extra.is_some() {
            Severity::Warning
        } else {
            Severity::Error
        }
    }

    pub fn label(&self) -> String {
        match &self.extra {
            Some(extra) => format!("[{extra}]"),
            None => "base dependencies".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("auto".parse::<ExtrasSelection>().unwrap(), ExtrasSelection::Auto);
        assert_eq!(" NONE ".parse::<ExtrasSelection>().unwrap(), ExtrasSelection::None);
        assert_eq!("base".parse::<ExtrasSelection>().unwrap(), ExtrasSelection::None);
        assert_eq!(
            "foo, bar,,".parse::<ExtrasSelection>().unwrap(),
            ExtrasSelection::List(names(&["foo", "bar"]))
        );
    }

    #[test]
    fn test_auto_moves_all_last() {
        let plan = plan_extras(&ExtrasSelection::Auto, &["bar", "all", "foo"]);
        assert_eq!(plan.extras, names(&["bar", "foo", "all"]));
        assert!(plan.unknown_finding().is_none());
    }

    #[test]
    fn test_none_selection() {
        let plan = plan_extras(&ExtrasSelection::None, &["bar", "all"]);
        assert!(plan.extras.is_empty());
    }

    #[test]
    fn test_unknown_extras() {
        let plan = plan_extras(&ExtrasSelection::List(names(&["zeta", "foo", "bogus"])), &["foo"]);
        assert_eq!(plan.extras, names(&["foo"]));
        let finding = plan.unknown_finding().unwrap();
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.details, "bogus, zeta");
        assert_eq!(finding.context, "config");
    }

    #[test]
    fn test_exclude_own_package() {
        let specs = names(&["pyhc-core[tests]==0.0.7", "numpy>=1.20", "PyHC_Core", "pyhc-core-extras"]);
        assert_eq!(
            exclude_package(&specs, "pyhc-core"),
            names(&["numpy>=1.20", "pyhc-core-extras"])
        );
    }

    #[test]
    fn test_request_for_extra() {
        let request = ResolveRequest::for_project(
            Path::new("/work/demo"),
            Some("doc"),
            &names(&["numpy>=1.20"]),
            &[],
            Some("3.12.9"),
        );
        assert_eq!(request.requirements, names(&["numpy>=1.20", "/work/demo[doc]"]));
        assert_eq!(request.context(), "doc");
        assert_eq!(request.severity(), Severity::Warning);
        assert_eq!(request.label(), "[doc]");
    }

    #[test]
    fn test_request_for_base() {
        let request = ResolveRequest::for_project(Path::new("/work/demo"), None, &[], &[], None);
        assert_eq!(request.requirements, names(&["/work/demo"]));
        assert_eq!(request.context(), "base");
        assert_eq!(request.severity(), Severity::Error);
    }
}
