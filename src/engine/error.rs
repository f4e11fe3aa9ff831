use thiserror::Error;

/// Errors returned by the decision engine.
///
/// Skip outcomes (no video, already HEVC) are not errors; they travel as
/// [`crate::engine::SkipReason`] inside a normal result.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no video stream found in probe data")]
    NoVideoStream,

    #[error("invalid probe: {0}")]
    InvalidProbe(String),

    #[error("invalid intent: '{field}' {message}")]
    InvalidIntent { field: &'static str, message: String },

    #[error("cannot move pipeline run from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("failed to parse probe JSON: {0}")]
    ProbeJson(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn intent(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidIntent {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
