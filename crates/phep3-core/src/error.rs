use thiserror::Error;

/// Core error types for phep3-check.
///
/// Policy violations are never errors: they are reported as
/// [`Finding`](crate::Finding) values. This type covers the cases where an
/// input cannot be read at all, or where the resolver could not be driven.
///
/// # Examples
///
/// ```
/// use phep3_core::error::{CheckError, Result};
///
/// fn load_schedule(content: &str) -> Result<()> {
///     if content.is_empty() {
///         return Err(CheckError::InvalidSchedule("empty document".into()));
///     }
///     Ok(())
/// }
///
/// assert!(load_schedule("").is_err());
/// ```
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("failed to parse {file_type}: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("resolver failed for {group}: {message}")]
    ResolverError { group: String, message: String },

    #[error("resolver timed out after {seconds}s for {group}")]
    ResolverTimeout { group: String, seconds: u64 },

    #[error("resolver executable not found: {0}")]
    ResolverNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    /// Wraps any error as a parse failure of the named file type.
    pub fn parse(
        file_type: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ParseError {
            file_type: file_type.into(),
            source: source.into(),
        }
    }

    pub fn resolver(group: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResolverError {
            group: group.into(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for `Result<T, CheckError>`.
pub type Result<T> = std::result::Result<T, CheckError>;
