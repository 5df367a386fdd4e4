//! Command-line front end for phep3-check.
//!
//! The `phep3` binary wires the workspace crates together:
//! - `phep3 check`: PHEP 3 compliance of a `pyproject.toml`
//! - `phep3 compat`: installability alongside the PyHC Environment via `uv`
//! - `phep3 interpret`: explain a saved `uv` failure
//!
//! Commands return a [`RunReport`] instead of printing, so they can be
//! driven from tests with a fixed clock and a scripted resolver.

pub mod ci;
pub mod cli;
pub mod commands;

pub use ci::CiEnvironment;
pub use commands::{RunReport, check, compat, compat_with, interpret};
