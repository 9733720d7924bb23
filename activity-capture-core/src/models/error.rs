use thiserror::Error;

/// Errors that can occur while capturing, mixing or encoding a session.
///
/// Setup and encode failures reach the session boundary; device and transient
/// errors are normally absorbed where they happen and only logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No capturable display surface. Fatal to the session.
    #[error("setup failed: {0}")]
    SetupFailure(String),

    /// Webcam or audio device missing. The session degrades.
    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    /// A single frame or audio chunk could not be acquired.
    #[error("transient capture error: {0}")]
    TransientCapture(String),

    #[error("encoding failed: {0}")]
    EncodeFailure(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Remote analysis of a finished recording failed. The video is kept.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
}

impl CaptureError {
    /// Whether the error should be swallowed by the caller (skip and continue).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientCapture(_))
    }
}
