use log::{debug, warn};

use activity_capture_core::analysis::remote;
use activity_capture_core::{AnalysisRequest, SessionOutcome, VideoAnalyzer};

/// Send a saved recording to the analysis service and return its report.
///
/// Analysis failures are logged and never affect the recording on disk.
pub fn hand_off(outcome: &SessionOutcome, analyzer: Option<&dyn VideoAnalyzer>, request: &AnalysisRequest) -> Option<String> {
    let SessionOutcome::Saved(result) = outcome else {
        return None;
    };
    let Some(analyzer) = analyzer else {
        debug!("No remote analyzer configured, skipping analysis");
        return None;
    };

    match remote::submit(analyzer, &result.file_path, request) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("{} (recording kept at {})", e, result.file_path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use activity_capture_core::{CaptureError, RecordingMetadata, RecordingResult, RemoteFile, RemoteFileState};
    use parking_lot::Mutex;

    use super::*;

    struct FakeAnalyzer {
        state: RemoteFileState,
        uploads: Mutex<Vec<PathBuf>>,
    }

    impl FakeAnalyzer {
        fn new(state: RemoteFileState) -> Self {
            Self {
                state,
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    impl VideoAnalyzer for FakeAnalyzer {
        fn upload(&self, video: &Path) -> Result<RemoteFile, CaptureError> {
            self.uploads.lock().push(video.to_path_buf());
            Ok(RemoteFile {
                name: "files/abc123".into(),
                uri: None,
            })
        }

        fn file_state(&self, _file: &RemoteFile) -> Result<RemoteFileState, CaptureError> {
            Ok(self.state.clone())
        }

        fn analyze(&self, _file: &RemoteFile, _prompt: &str) -> Result<String, CaptureError> {
            Ok("1) Overview: coding".into())
        }
    }

    fn saved(name: &str) -> SessionOutcome {
        let path = std::env::temp_dir().join(format!("activity_capture_app_test_{}_{}.mp4", std::process::id(), name));
        fs::write(&path, b"mp4").unwrap();
        let path_str = path.display().to_string();
        SessionOutcome::Saved(RecordingResult {
            file_path: path,
            duration_secs: 3.0,
            frame_count: 3,
            has_audio: false,
            checksum: "00".into(),
            metadata: RecordingMetadata::new("2026-01-01T00:00:00", 3.0, &path_str, "00", 3, 1.0, (640, 480), "h264", None),
        })
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
            ..AnalysisRequest::default()
        }
    }

    fn cleanup(outcome: &SessionOutcome) {
        if let SessionOutcome::Saved(result) = outcome {
            let _ = fs::remove_file(&result.file_path);
        }
    }

    #[test]
    fn saved_recording_is_analyzed() {
        let outcome = saved("handoff_ok");
        let analyzer = FakeAnalyzer::new(RemoteFileState::Active);

        let report = hand_off(&outcome, Some(&analyzer), &request());

        assert_eq!(report.as_deref(), Some("1) Overview: coding"));
        assert_eq!(analyzer.uploads.lock().len(), 1);
        cleanup(&outcome);
    }

    #[test]
    fn failed_analysis_keeps_the_recording() {
        let outcome = saved("handoff_failed");
        let analyzer = FakeAnalyzer::new(RemoteFileState::Failed("FAILED".into()));

        assert_eq!(hand_off(&outcome, Some(&analyzer), &request()), None);
        if let SessionOutcome::Saved(result) = &outcome {
            assert!(result.file_path.exists());
        }
        cleanup(&outcome);
    }

    #[test]
    fn nothing_to_save_or_no_analyzer_skips() {
        let analyzer = FakeAnalyzer::new(RemoteFileState::Active);
        assert_eq!(hand_off(&SessionOutcome::NothingToSave, Some(&analyzer), &request()), None);
        assert!(analyzer.uploads.lock().is_empty());

        let outcome = saved("handoff_none");
        assert_eq!(hand_off(&outcome, None, &request()), None);
        cleanup(&outcome);
    }
}
