//! Error types for the clinic desk core.

use thiserror::Error;

/// Failures reported by the hosted backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[cfg(feature = "rest")]
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// Application level error.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown patient: {0}")]
    UnknownPatient(String),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("local state error: {0}")]
    LocalState(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl From<validator::ValidationErrors> for ClinicError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| "invalid".to_string());
                format!("{}: {}", field, detail)
            })
            .collect();
        fields.sort();
        ClinicError::Validation(fields.join(", "))
    }
}

pub type Result<T, E = ClinicError> = std::result::Result<T, E>;
