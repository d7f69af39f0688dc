//! Error types for pipeline construction and calibration.
//!
//! Every [`BuildError`] is raised during the single startup build pass and is
//! fatal: the bootstrap caller stops initializing sensors instead of running
//! with a colliding or half-wired pipeline table. Nothing here is retried,
//! the root cause is always static data.

use thiserror::Error;

/// Convenience alias for results of the build pass.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invalid sensor definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    #[error("Telemetry path '{0}' is already registered")]
    DuplicateTelemetryPath(String),

    #[error("Configuration path '{0}' is already registered")]
    DuplicateConfigPath(String),

    #[error("Hardware binding error on {resource}: {reason}")]
    HardwareBindingError { resource: String, reason: String },
}

impl BuildError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        BuildError::InvalidDefinition {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn binding(resource: impl ToString, reason: impl Into<String>) -> Self {
        BuildError::HardwareBindingError {
            resource: resource.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors from the runtime calibration hooks on a built pipeline set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("No pipeline stage is addressed by configuration path '{0}'")]
    UnknownConfigPath(String),

    #[error("Stage at configuration path '{0}' does not accept calibration")]
    NotCalibratable(String),
}
