//! Python packaging model for phep3-check.
//!
//! This crate turns Python project declarations into the structured form the
//! policy engine consumes:
//! - **Bounds**: [`extract_bounds`] folds a PEP 440 specifier into [`VersionBounds`]
//! - **Parsing**: PEP 508 requirements, `[project]` tables, requirement lists
//! - **Markers**: classifying `python_version` markers against supported interpreters
//!
//! # Examples
//!
//! ```
//! use phep3_pypi::{extract_bounds, parse_dependency};
//!
//! let dep = parse_dependency("scipy>=1.11,<2").unwrap();
//! let bounds = extract_bounds(dep.specifier.as_deref());
//!
//! assert_eq!(bounds.lower.unwrap().to_string(), "1.11");
//! assert!(bounds.has_upper_constraint);
//! ```

pub mod bounds;
pub mod error;
pub mod markers;
pub mod parser;
pub mod types;

pub use bounds::{VersionBounds, extract_bounds, major_minor, minor_string, same_minor};
pub use error::{PypiError, Result};
pub use markers::{MarkerApplicability, python_marker_applicability};
pub use parser::{parse_dependency, parse_package_specs, parse_pyproject, parse_pyproject_file};
pub use types::{ExtrasGroup, ParsedDependency, ProjectMetadata, normalize_package_name};
