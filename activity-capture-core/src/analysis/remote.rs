use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use crate::models::error::CaptureError;
use crate::traits::video_analyzer::VideoAnalyzer;

pub const DEFAULT_PROMPT: &str = "Describe what I am doing in this video and summarize the key activities along a timeline. \
My webcam is in the top-right corner: assess whether I am focused, e.g. looking at the screen or visibly distracted. \
The wall-clock time is shown below the webcam; identify timestamps of key moments and mark them in the report as MM:SS. \
Structure the output as:\n1) Overview\n2) Key events (with timestamps)\n3) Focus assessment\n4) Other observations\n5) Summary and suggestions.";

/// Parameters of one remote analysis hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Upload a finished video, wait for the service to accept it and return the
/// report.
pub fn submit(analyzer: &dyn VideoAnalyzer, video: &Path, request: &AnalysisRequest) -> Result<String, CaptureError> {
    if !video.is_file() {
        return Err(CaptureError::AnalysisFailed(format!("video not found: {}", video.display())));
    }

    let file = analyzer.upload(video)?;
    info!("Uploaded {} as {}", video.display(), file.name);

    analyzer.wait_until_ready(&file, request.poll_interval, request.timeout)?;
    debug!("{} is active, requesting report", file.name);

    analyzer.analyze(&file, &request.prompt)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::path::PathBuf;

    use parking_lot::Mutex;

    use super::*;
    use crate::traits::video_analyzer::{RemoteFile, RemoteFileState};

    /// Analyzer that replays a scripted sequence of file states.
    struct ScriptedAnalyzer {
        states: Mutex<VecDeque<RemoteFileState>>,
        uploads: Mutex<Vec<PathBuf>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAnalyzer {
        fn new(states: Vec<RemoteFileState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                uploads: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl VideoAnalyzer for ScriptedAnalyzer {
        fn upload(&self, video: &Path) -> Result<RemoteFile, CaptureError> {
            self.uploads.lock().push(video.to_path_buf());
            Ok(RemoteFile {
                name: "files/session".into(),
                uri: Some("https://example.invalid/files/session".into()),
            })
        }

        fn file_state(&self, _file: &RemoteFile) -> Result<RemoteFileState, CaptureError> {
            let mut states = self.states.lock();
            // the last scripted state repeats
            match states.len() {
                0 => Ok(RemoteFileState::Processing),
                1 => Ok(states[0].clone()),
                _ => Ok(states.pop_front().unwrap_or(RemoteFileState::Processing)),
            }
        }

        fn analyze(&self, file: &RemoteFile, prompt: &str) -> Result<String, CaptureError> {
            self.prompts.lock().push(prompt.to_string());
            Ok(format!("report for {}", file.name))
        }
    }

    fn video(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("activity_capture_test_{}_{}.mp4", std::process::id(), name));
        fs::write(&path, b"not really a video").unwrap();
        path
    }

    fn fast_request() -> AnalysisRequest {
        AnalysisRequest {
            prompt: "what happened?".into(),
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn waits_for_active_then_reports() {
        let path = video("remote_ok");
        let analyzer = ScriptedAnalyzer::new(vec![
            RemoteFileState::Processing,
            RemoteFileState::Processing,
            RemoteFileState::Active,
        ]);

        let report = submit(&analyzer, &path, &fast_request()).unwrap();

        assert_eq!(report, "report for files/session");
        assert_eq!(*analyzer.uploads.lock(), vec![path.clone()]);
        assert_eq!(*analyzer.prompts.lock(), vec!["what happened?".to_string()]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn terminal_state_fails_without_analyzing() {
        let path = video("remote_failed");
        let analyzer = ScriptedAnalyzer::new(vec![RemoteFileState::Processing, RemoteFileState::Failed("FAILED".into())]);

        let result = submit(&analyzer, &path, &fast_request());

        assert!(matches!(result, Err(CaptureError::AnalysisFailed(_))));
        assert!(analyzer.prompts.lock().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn never_active_times_out() {
        let path = video("remote_timeout");
        let analyzer = ScriptedAnalyzer::new(vec![RemoteFileState::Processing]);
        let request = AnalysisRequest {
            timeout: Duration::from_millis(20),
            ..fast_request()
        };

        match submit(&analyzer, &path, &request) {
            Err(CaptureError::AnalysisFailed(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(analyzer.prompts.lock().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_video_is_not_uploaded() {
        let analyzer = ScriptedAnalyzer::new(vec![RemoteFileState::Active]);
        let missing = std::env::temp_dir().join("activity_capture_test_no_such_video.mp4");

        assert!(matches!(
            submit(&analyzer, &missing, &fast_request()),
            Err(CaptureError::AnalysisFailed(_))
        ));
        assert!(analyzer.uploads.lock().is_empty());
    }

    #[test]
    fn default_request_polls_every_two_seconds_for_five_minutes() {
        let request = AnalysisRequest::default();
        assert_eq!(request.poll_interval, Duration::from_secs(2));
        assert_eq!(request.timeout, Duration::from_secs(300));
        assert!(request.prompt.contains("MM:SS"));
    }
}
