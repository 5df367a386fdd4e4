//! Environment-compatibility checks for phep3-check.
//!
//! Answers "can this package be installed alongside the PyHC Environment?"
//! by delegating resolution to `uv` and interpreting what it says when the
//! answer is no:
//! - **Conflicts**: [`parse_solver_error`] turns solver prose into [`Conflict`] values
//! - **Failures**: [`interpret_solver_failure`] screens out platform and interpreter noise
//! - **Python**: [`check_python_compatibility`] catches `requires-python` mismatches up front
//! - **Resolution**: [`Resolver`], [`UvResolver`] and the order-preserving [`run_groups`]
//!
//! # Examples
//!
//! ```
//! use phep3_compat::{SolverOutcome, interpret_solver_failure};
//!
//! let stderr = "Because project depends on numpy<2.0 and you require numpy>=2.0, \
//!               we can conclude that your requirements are unsatisfiable.";
//!
//! match interpret_solver_failure(stderr, Some("demo")) {
//!     SolverOutcome::Conflicts(conflicts) => assert_eq!(conflicts[0].package, "numpy"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

pub mod conflict;
pub mod failure;
pub mod groups;
pub mod python;
pub mod resolver;

pub use conflict::{
    Conflict, NO_SOLUTION_MARKER, error_summary, extract_fallback_conflict, parse_solver_error,
};
pub use failure::{
    SolverOutcome, conflict_finding, interpret_solver_failure, is_platform_specific,
    outcome_findings, python_version_mismatch,
};
pub use groups::{ExtrasPlan, ExtrasSelection, ResolveRequest, exclude_package, plan_extras};
pub use python::{check_python_compatibility, python_conflict_finding, python_version_from_environment};
pub use resolver::{
    DEFAULT_TIMEOUT, GroupReport, ResolveOutput, Resolver, UvResolver, run_groups,
};
