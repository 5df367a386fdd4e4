//! Core types for phep3-check.
//!
//! This crate provides the pieces shared by the policy engine and the
//! environment-compatibility checker:
//! - **Findings**: [`Finding`] and [`Severity`], the unit of every report
//! - **Reporter**: plain-text, annotation and markdown rendering plus exit status
//! - **Error Types**: [`CheckError`] for inputs that cannot be processed at all
//!
//! # Examples
//!
//! ```
//! use phep3_core::{Finding, Reporter};
//!
//! let mut reporter = Reporter::new("PHEP 3 Compliance Check");
//! reporter.add(
//!     Finding::error("python", "requires-python = \">=3.13\" drops support for Python 3.12 too early")
//!         .with_suggestion("Change to requires-python = \">=3.12\""),
//! );
//!
//! assert_eq!(reporter.exit_code(false), 1);
//! assert!(reporter.render_plain().contains("Status: FAILED"));
//! ```

pub mod error;
pub mod finding;
pub mod reporter;

pub use error::{CheckError, Result};
pub use finding::{BASE_CONTEXT, Finding, Severity};
pub use reporter::Reporter;
