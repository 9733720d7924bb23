use std::sync::Arc;

use log::{error, info, warn};

use activity_capture_core::{CaptureDelegate, CaptureError, CaptureState, RecordingResult};

/// CaptureDelegate that reports session events to the operator through the log.
pub struct LogDelegate;

impl LogDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl CaptureDelegate for LogDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        match state {
            CaptureState::Done(None) => info!("Session done: nothing to save"),
            CaptureState::Failed(e) => error!("Session failed: {}", e),
            other => info!("Session {}", other.name()),
        }
    }

    fn on_error(&self, error: &CaptureError) {
        match error {
            CaptureError::DeviceUnavailable(_) | CaptureError::TransientCapture(_) => warn!("{}", error),
            _ => error!("{}", error),
        }
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        info!(
            "Recording saved: {} ({} frames, {:.1}s, {}, sha256 {})",
            result.file_path.display(),
            result.frame_count,
            result.duration_secs,
            if result.has_audio { "with audio" } else { "video only" },
            result.checksum
        );
    }
}
