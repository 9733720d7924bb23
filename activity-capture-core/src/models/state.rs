use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stopping → encoding → done
///   └─────────┴──────────┴──────────┴────→ failed
/// ```
///
/// `Done(None)` means the session stopped with no frames and nothing was saved.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopping,
    Encoding,
    Done(Option<Box<RecordingResult>>),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Encoding => "encoding",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(CaptureState::Done(None).is_terminal());
        assert!(CaptureState::Failed(CaptureError::SetupFailure("x".into())).is_terminal());
        assert!(!CaptureState::Recording.is_terminal());
        assert!(!CaptureState::Encoding.is_terminal());
    }
}
