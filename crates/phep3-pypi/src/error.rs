//! Errors specific to Python manifest handling.

use phep3_core::CheckError;
use thiserror::Error;

/// Errors raised while reading Python project manifests.
///
/// Individual dependency lines that fail to parse are not errors: they are
/// logged and skipped. Only a manifest that cannot be read at all fails.
#[derive(Error, Debug)]
pub enum PypiError {
    /// Failed to parse pyproject.toml
    #[error("Failed to parse pyproject.toml: {source}")]
    TomlParseError {
        #[source]
        source: toml_edit::TomlError,
    },

    /// Invalid PEP 508 requirement string
    #[error("Invalid requirement '{requirement}': {message}")]
    InvalidRequirement { requirement: String, message: String },

    /// Invalid pyproject.toml structure
    #[error("Invalid pyproject.toml structure: {message}")]
    InvalidStructure { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, PypiError>;

impl PypiError {
    pub fn invalid_requirement(requirement: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidRequirement {
            requirement: requirement.into(),
            message: message.to_string(),
        }
    }
}

impl From<PypiError> for CheckError {
    fn from(err: PypiError) -> Self {
        match err {
            PypiError::Io(e) => Self::Io(e),
            other => Self::parse("pyproject.toml", other),
        }
    }
}
