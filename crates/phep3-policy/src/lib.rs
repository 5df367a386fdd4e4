//! PHEP 3 support-window policy engine.
//!
//! - **Config**: [`PolicyConfig`] carries the window lengths and the core-package allowlist
//! - **Schedule**: [`Schedule`] answers which versions must be supported, may be dropped,
//!   or must already be adopted at a given instant
//! - **Checker**: [`check_compliance`] turns a project plus a schedule into findings
//!
//! Every query takes `now` explicitly, so results are reproducible for a
//! fixed schedule snapshot.

pub mod checker;
pub mod config;
pub mod schedule;

pub use checker::{
    CheckOptions, check_compliance, check_dependency, check_python_version, passes,
    supported_python_versions,
};
pub use config::{DAYS_PER_MONTH, PolicyConfig, months};
pub use schedule::{Component, Schedule, VersionSchedule, VersionTable, parse_timestamp};
