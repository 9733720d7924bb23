use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use activity_capture_core::{CaptureConfiguration, CaptureError, SessionOutcome};

/// Build a session from the desktop backends and run the capture loop until
/// `stop` is set.
#[cfg(feature = "devices")]
pub fn record(config: CaptureConfiguration, stop: Arc<AtomicBool>) -> Result<SessionOutcome, CaptureError> {
    use activity_capture_core::{ActivityLog, CaptureLoop, CaptureSession, FfmpegMuxer};
    use activity_capture_desktop::{CpalAudioProvider, NokhwaWebcam, XcapScreen, XpropObserver};
    use log::warn;

    let log = ActivityLog::open(&config.activity_log_path)?;
    let muxer = FfmpegMuxer::new(config.encoder.clone());
    let enable_webcam = config.enable_webcam;

    let mut session = CaptureSession::new(config, XcapScreen::primary(), muxer)
        .with_audio(Arc::new(CpalAudioProvider::new()));
    if enable_webcam {
        match NokhwaWebcam::open(0) {
            Ok(webcam) => session = session.with_webcam(Box::new(webcam)),
            Err(e) => warn!("Webcam unavailable, recording screen only: {}", e),
        }
    }
    session.set_delegate(crate::delegate::LogDelegate::new());

    CaptureLoop::new(XpropObserver::new(), session, log, stop).run()
}

#[cfg(not(feature = "devices"))]
pub fn record(_config: CaptureConfiguration, _stop: Arc<AtomicBool>) -> Result<SessionOutcome, CaptureError> {
    Err(CaptureError::SetupFailure(
        "built without device backends; rebuild with `--features devices`".into(),
    ))
}
