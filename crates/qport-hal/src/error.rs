//! Error types for the HAL crate.

use qport_compile::CompileError;
use thiserror::Error;

/// Errors that can occur in backend operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The handle was never produced by this backend instance.
    #[error("Circuit corresponding to {0} has not been run by this backend instance.")]
    CircuitNotRun(String),

    /// A circuit fails one of the backend's predicates.
    #[error("Circuit with index {index} is not valid for this backend: it fails predicate {predicate}")]
    CircuitNotValid {
        /// Position of the circuit in the submitted batch.
        index: usize,
        /// Name of the first failing predicate.
        predicate: String,
    },

    /// Handle does not have the shape this backend issues.
    #[error("Invalid result handle: {0}")]
    InvalidHandle(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Job submission failed.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Gave up waiting for a result.
    #[error("{0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Compilation error.
    #[error("Compilation error: {0}")]
    Compile(#[from] CompileError),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = HalError::CircuitNotValid {
            index: 2,
            predicate: "NoMidMeasure".into(),
        };
        assert_eq!(
            err.to_string(),
            "Circuit with index 2 is not valid for this backend: it fails predicate NoMidMeasure"
        );
        let err = HalError::Timeout("Timed out: no results after 5 seconds.".into());
        assert_eq!(err.to_string(), "Timed out: no results after 5 seconds.");
    }
}
