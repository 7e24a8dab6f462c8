//! Error types for the pipeline driver.
//!
//! Only source, transform, and configuration faults exist at this level;
//! per-message publish failures are absorbed into the fan-out stats and
//! never surface here.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline faults, propagated to the invoker.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The data source failed.
    #[error("database error: {0}")]
    Database(String),

    /// The record-to-message transform failed.
    #[error("transform error: {0}")]
    Transform(String),

    /// The pipeline was wired with unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PipelineError {
    /// Stable label for the `error.type` span tag.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Transform(_) => "transform",
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(PipelineError::Database(String::new()).label(), "database");
        assert_eq!(PipelineError::Transform(String::new()).label(), "transform");
        assert_eq!(PipelineError::Configuration(String::new()).label(), "configuration");
    }
}
