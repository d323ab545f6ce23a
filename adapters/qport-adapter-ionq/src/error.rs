//! Error types for the IonQ adapter.

use qport_hal::HalError;
use thiserror::Error;

/// Result type for IonQ operations.
pub type IonQResult<T> = Result<T, IonQError>;

/// Errors that can occur when interacting with IonQ.
#[derive(Debug, Error)]
pub enum IonQError {
    /// No API key from the caller, the config file or the environment.
    #[error("No IonQ api key provided or found in config file.")]
    Authentication,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not reach the IonQ API.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API answered with a non-JSON error page.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// API answered, but not with what the request needs.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// Circuit contains an operation IonQ does not run.
    #[error("Unsupported gate: {0}")]
    UnsupportedGate(String),

    /// Circuit contains an unbound symbolic parameter.
    #[error("Symbolic (unbound) parameter in gate: {0}")]
    SymbolicParameter(String),

    /// Config file could not be read.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<IonQError> for HalError {
    fn from(e: IonQError) -> Self {
        match e {
            IonQError::Authentication | IonQError::ApiError { status: 401, .. } => {
                HalError::AuthenticationFailed(e.to_string())
            }
            IonQError::Http(err) => HalError::Network(err),
            IonQError::Json(err) => HalError::Serialization(err),
            IonQError::Config(msg) => HalError::Configuration(msg),
            _ => HalError::Backend(e.to_string()),
        }
    }
}
