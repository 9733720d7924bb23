use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::error::CaptureError;

/// Processing state of an uploaded recording on the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFileState {
    Processing,
    Active,
    /// Terminal: failed, deleting or deleted.
    Failed(String),
}

/// Handle to a recording the analysis service has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub uri: Option<String>,
}

/// Remote video-understanding service fed with finished recordings.
///
/// Implementations block on network calls; callers run them after the
/// session has reached `Done`, never from the capture loop.
pub trait VideoAnalyzer: Send + Sync {
    /// Upload a finished video.
    fn upload(&self, video: &Path) -> Result<RemoteFile, CaptureError>;

    /// Current processing state of an uploaded file.
    fn file_state(&self, file: &RemoteFile) -> Result<RemoteFileState, CaptureError>;

    /// Request a natural-language report for an active file.
    fn analyze(&self, file: &RemoteFile, prompt: &str) -> Result<String, CaptureError>;

    /// Poll `file_state` every `poll` until the file is active.
    ///
    /// Fails on a terminal state, or once `timeout` has elapsed without the
    /// file becoming active.
    fn wait_until_ready(&self, file: &RemoteFile, poll: Duration, timeout: Duration) -> Result<(), CaptureError> {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.file_state(file)?;
            match state {
                RemoteFileState::Active => return Ok(()),
                RemoteFileState::Failed(reason) => {
                    return Err(CaptureError::AnalysisFailed(format!("{} entered terminal state {}", file.name, reason)));
                }
                RemoteFileState::Processing => {}
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::AnalysisFailed(format!(
                    "timed out after {:?} waiting for {} to become active",
                    timeout, file.name
                )));
            }
            thread::sleep(poll);
        }
    }
}
