//! Domain error types.
//!
//! Rule-level outcomes (inconclusive data, ambiguous classification) are never
//! errors: they land in the reason log as WAIT. Only malformed input and
//! malformed configuration surface here.

use crate::domain::universe::UniverseError;

/// Top-level error type for gatekeeper.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no snapshot for {ticker}")]
    SnapshotNotFound { ticker: String },

    #[error("snapshot source error: {reason}")]
    SnapshotSource { reason: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the failure kinds that stop a run before any snapshot is evaluated.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::ConfigParse { .. } | EngineError::ConfigInvalid { .. }
        )
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) | EngineError::Json(_) => 1,
            EngineError::ConfigParse { .. } | EngineError::ConfigInvalid { .. } => 2,
            EngineError::SnapshotNotFound { .. } | EngineError::SnapshotSource { .. } => 3,
            EngineError::InvalidInput { .. } | EngineError::Universe(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
