use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Called from the capture loop thread.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a degrading or fatal error occurs.
    fn on_error(&self, error: &CaptureError);

    /// Called when the encoded video has been written and verified.
    fn on_capture_finished(&self, result: &RecordingResult);
}
