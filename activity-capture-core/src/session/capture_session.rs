use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use super::audio_mixer::{AudioMixer, AudioOutcome};
use crate::models::audio_models::AudioDiagnostics;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::frame::Frame;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::compositor::FrameCompositor;
use crate::storage::{checksum, metadata, wav_writer};
use crate::traits::audio_device::AudioDeviceProvider;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_source::{ScreenSource, WebcamSource};
use crate::traits::muxer::Muxer;

/// Final result of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Saved(RecordingResult),
    /// No frames were captured; the muxer was not invoked.
    NothingToSave,
}

/// One recording session: frame sequence, audio unit and lifecycle.
///
/// ```text
/// idle → recording → stopping → encoding → done
///   └─────────┴──────────┴──────────┴────→ failed
/// ```
///
/// The session is driven from a single capture loop, which is the only
/// writer of the frame sequence. The audio unit runs on its own thread and
/// shares nothing with the session except the cancellation flag and the
/// diagnostics counters. Stopping always joins that thread before encoding,
/// so the audio sink is closed by the time the muxer reads it.
pub struct CaptureSession<S: ScreenSource, M: Muxer> {
    config: CaptureConfiguration,
    screen: S,
    muxer: M,
    compositor: FrameCompositor,
    webcam: Option<Box<dyn WebcamSource>>,
    webcam_degraded: bool,
    audio_provider: Option<Arc<dyn AudioDeviceProvider>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,

    state: CaptureState,
    frames: Vec<Frame>,
    started_at: Option<DateTime<Local>>,
    stopped_at: Option<DateTime<Local>>,

    // Audio thread control
    cancel: Arc<AtomicBool>,
    audio_handle: Option<thread::JoinHandle<AudioOutcome>>,
    audio_outcome: Option<AudioOutcome>,
    diagnostics: Arc<Mutex<AudioDiagnostics>>,
}

impl<S: ScreenSource, M: Muxer> CaptureSession<S, M> {
    pub fn new(config: CaptureConfiguration, screen: S, muxer: M) -> Self {
        Self {
            compositor: FrameCompositor::new(&config),
            config,
            screen,
            muxer,
            webcam: None,
            webcam_degraded: false,
            audio_provider: None,
            delegate: None,
            state: CaptureState::Idle,
            frames: Vec::new(),
            started_at: None,
            stopped_at: None,
            cancel: Arc::new(AtomicBool::new(false)),
            audio_handle: None,
            audio_outcome: None,
            diagnostics: Arc::new(Mutex::new(AudioDiagnostics::default())),
        }
    }

    /// Attach an already-acquired webcam. It is released exactly once, at stop.
    pub fn with_webcam(mut self, webcam: Box<dyn WebcamSource>) -> Self {
        self.webcam = Some(webcam);
        self
    }

    pub fn with_audio(mut self, provider: Arc<dyn AudioDeviceProvider>) -> Self {
        self.audio_provider = Some(provider);
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn diagnostics(&self) -> AudioDiagnostics {
        self.diagnostics.lock().clone()
    }

    /// How the audio unit ended, once the session has stopped.
    pub fn audio_outcome(&self) -> Option<&AudioOutcome> {
        self.audio_outcome.as_ref()
    }

    /// Start recording. Transitions: idle → recording.
    ///
    /// Calling this while already recording is a no-op. Fails with
    /// `SetupFailure` (and moves to `Failed`) when no display can be captured.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.is_recording() {
            debug!("start() while recording, ignoring");
            return Ok(());
        }
        if !self.state.is_idle() {
            return Err(CaptureError::InvalidState(format!(
                "cannot start from {} state",
                self.state.name()
            )));
        }

        if !self.screen.is_available() {
            let err = CaptureError::SetupFailure("no capturable display surface".into());
            self.fail(err.clone());
            return Err(err);
        }

        if !self.config.enable_webcam {
            self.release_webcam();
        } else if self.webcam.is_none() {
            warn!("No webcam attached, recording screen only");
        }

        self.frames.clear();
        self.started_at = Some(Local::now());
        self.cancel.store(false, Ordering::SeqCst);

        if self.config.enable_audio {
            self.start_audio();
        } else {
            info!("Audio disabled by configuration");
        }

        self.set_state(CaptureState::Recording);
        info!("Recording started");
        Ok(())
    }

    /// Capture one composite frame and append it to the sequence.
    ///
    /// Returns `Ok(false)` when the tick is skipped because the screen could
    /// not be grabbed.
    pub fn capture_frame(&mut self) -> Result<bool, CaptureError> {
        if !self.state.is_recording() {
            return Err(CaptureError::InvalidState("can only capture while recording".into()));
        }

        let screen = match self.screen.grab() {
            Ok(image) if image.width() > 0 && image.height() > 0 => image,
            Ok(_) => {
                warn!("Screen capture returned an empty image, skipping frame");
                return Ok(false);
            }
            Err(e) => {
                warn!("Screen capture failed, skipping frame: {}", e);
                return Ok(false);
            }
        };

        let webcam = self.read_webcam();
        let captured_at = Local::now();
        let image = self
            .compositor
            .compose(&screen, webcam.as_ref(), captured_at.naive_local());

        let sequence = self.frames.len() as u64;
        self.frames.push(Frame {
            image,
            captured_at,
            sequence,
        });
        debug!("Captured frame {}", sequence);
        Ok(true)
    }

    /// Stop recording. Transitions: recording → stopping.
    ///
    /// Blocks until the audio unit has exited and the sink is closed, then
    /// releases the webcam.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_recording() {
            return Err(CaptureError::InvalidState(format!(
                "cannot stop from {} state",
                self.state.name()
            )));
        }

        self.set_state(CaptureState::Stopping);
        self.stopped_at = Some(Local::now());
        self.cancel.store(true, Ordering::SeqCst);
        self.join_audio();
        self.release_webcam();
        info!("Recording stopped with {} frames", self.frames.len());
        Ok(())
    }

    /// Encode the captured frames. Transitions: stopping → encoding → done.
    ///
    /// An empty session goes straight to `Done(None)`. On encode failure the
    /// session moves to `Failed` and the temporary audio file is kept.
    pub fn save(&mut self) -> Result<SessionOutcome, CaptureError> {
        if !matches!(self.state, CaptureState::Stopping) {
            return Err(CaptureError::InvalidState(format!(
                "cannot save from {} state",
                self.state.name()
            )));
        }

        if self.frames.is_empty() {
            info!("No frames captured, nothing to save");
            self.set_state(CaptureState::Done(None));
            return Ok(SessionOutcome::NothingToSave);
        }

        self.set_state(CaptureState::Encoding);

        let audio = self.audio_track();
        let output = match self.output_path() {
            Ok(path) => path,
            Err(e) => {
                self.fail(e.clone());
                return Err(e);
            }
        };

        info!(
            "Encoding {} frames to {} ({})",
            self.frames.len(),
            output.display(),
            if audio.is_some() { "with audio" } else { "video only" }
        );

        if let Err(e) = self.muxer.mux(&self.frames, self.config.fps, audio.as_deref(), &output) {
            let err = match e {
                CaptureError::EncodeFailure(_) => e,
                other => CaptureError::EncodeFailure(other.to_string()),
            };
            error!("{}", err);
            self.fail(err.clone());
            return Err(err);
        }

        if let Some(AudioOutcome::Recorded { path, .. }) = &self.audio_outcome {
            if let Err(e) = fs::remove_file(path) {
                warn!("Failed to remove temporary audio {}: {}", path.display(), e);
            }
        }

        let result = match self.build_result(output, audio.is_some()) {
            Ok(result) => result,
            Err(e) => {
                self.fail(e.clone());
                return Err(e);
            }
        };

        info!("Saved {} ({})", result.file_path.display(), result.checksum);
        self.set_state(CaptureState::Done(Some(Box::new(result.clone()))));
        if let Some(ref delegate) = self.delegate {
            delegate.on_capture_finished(&result);
        }
        Ok(SessionOutcome::Saved(result))
    }

    /// Stop (if recording) and save.
    ///
    /// A session that never started reports `NothingToSave`.
    pub fn finish(&mut self) -> Result<SessionOutcome, CaptureError> {
        if self.state.is_idle() {
            self.release_webcam();
            self.set_state(CaptureState::Done(None));
            return Ok(SessionOutcome::NothingToSave);
        }
        if self.state.is_recording() {
            self.stop()?;
        }
        self.save()
    }

    // --- Internal helpers ---

    fn set_state(&mut self, new_state: CaptureState) {
        debug!("Session state: {} -> {}", self.state.name(), new_state.name());
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }

    fn fail(&mut self, err: CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&err);
        }
        self.set_state(CaptureState::Failed(err));
    }

    fn report_degraded(&self, err: CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&err);
        }
    }

    fn start_audio(&mut self) {
        let Some(provider) = self.audio_provider.clone() else {
            warn!("No audio devices attached, recording without audio");
            return;
        };

        *self.diagnostics.lock() = AudioDiagnostics::default();
        let mixer = AudioMixer::new(provider, &self.config, Arc::clone(&self.diagnostics));
        match mixer.spawn(Arc::clone(&self.cancel)) {
            Ok(handle) => self.audio_handle = Some(handle),
            Err(e) => {
                warn!("Recording without audio: {}", e);
                self.report_degraded(e);
            }
        }
    }

    fn join_audio(&mut self) {
        let Some(handle) = self.audio_handle.take() else {
            return;
        };
        let outcome = match handle.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Audio thread panicked");
                AudioOutcome::Disabled("audio thread panicked".into())
            }
        };
        if let AudioOutcome::Disabled(ref reason) = outcome {
            self.report_degraded(CaptureError::DeviceUnavailable(reason.clone()));
        }
        self.audio_outcome = Some(outcome);
    }

    fn read_webcam(&mut self) -> Option<image::RgbImage> {
        let webcam = self.webcam.as_mut()?;
        match webcam.read_frame() {
            Ok(image) => {
                self.webcam_degraded = false;
                Some(image)
            }
            Err(e) => {
                if !self.webcam_degraded {
                    warn!("Webcam unavailable, continuing screen-only: {}", e);
                    self.webcam_degraded = true;
                    self.report_degraded(CaptureError::DeviceUnavailable(e.to_string()));
                } else {
                    debug!("Webcam read failed: {}", e);
                }
                None
            }
        }
    }

    fn release_webcam(&mut self) {
        if let Some(mut webcam) = self.webcam.take() {
            webcam.release();
        }
    }

    /// The finalized sink, if it holds any audio.
    fn audio_track(&self) -> Option<PathBuf> {
        match &self.audio_outcome {
            Some(AudioOutcome::Recorded { path, bytes }) if *bytes > 0 => {
                wav_writer::wav_data_len(path)
                    .filter(|len| *len > 0)
                    .map(|_| path.clone())
            }
            _ => None,
        }
    }

    fn output_path(&self) -> Result<PathBuf, CaptureError> {
        let dir = &self.config.output_directory;
        fs::create_dir_all(dir).map_err(|e| {
            CaptureError::EncodeFailure(format!("failed to create {}: {}", dir.display(), e))
        })?;
        let started_at = self.started_at.unwrap_or_else(Local::now);
        Ok(dir.join(format!("session_{}.mp4", started_at.format("%Y-%m-%d_%H-%M-%S"))))
    }

    fn build_result(&self, output: PathBuf, has_audio: bool) -> Result<RecordingResult, CaptureError> {
        let checksum = checksum::sha256_file(&output)?;

        let started_at = self.started_at.unwrap_or_else(Local::now);
        let stopped_at = self.stopped_at.unwrap_or_else(Local::now);
        let duration_secs = (stopped_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;

        let (width, height) = self
            .frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or_default();
        let (video_codec, audio_codec) = self.muxer.codecs();

        let recording_metadata = RecordingMetadata::new(
            &started_at.to_rfc3339(),
            duration_secs,
            &output.to_string_lossy(),
            &checksum,
            self.frames.len(),
            self.config.fps,
            (width, height),
            &video_codec,
            has_audio.then_some(audio_codec.as_str()),
        );
        if let Err(e) = metadata::write_metadata(&recording_metadata, &output) {
            warn!("Failed to write metadata sidecar: {}", e);
        }

        Ok(RecordingResult {
            file_path: output,
            duration_secs,
            frame_count: self.frames.len(),
            has_audio,
            checksum,
            metadata: recording_metadata,
        })
    }
}

impl<S: ScreenSource, M: Muxer> Drop for CaptureSession<S, M> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.audio_handle.take() {
            let _ = handle.join();
        }
        self.release_webcam();
    }
}
