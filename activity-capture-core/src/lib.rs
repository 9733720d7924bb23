//! # activity-capture-core
//!
//! Platform-agnostic core of an activity-triggered screen, webcam and audio
//! recorder.
//!
//! Watches the foreground window through an [`ActivityObserver`], captures a
//! composite frame on every activity transition (and periodically while
//! recording), mixes loopback and microphone audio on a dedicated thread, and
//! muxes everything into one video when the session ends. Platform backends
//! implement the traits in [`traits`] and plug into the generic
//! [`CaptureSession`].
//!
//! ## Architecture
//!
//! ```text
//! activity-capture-core (this crate)
//! ├── traits/       ← ScreenSource, WebcamSource, AudioDeviceProvider, ActivityObserver, Muxer, CaptureDelegate, VideoAnalyzer
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, ActivityState, Frame, AudioChunk, etc.
//! ├── processing/   ← FrameCompositor, ChunkMixer, RingBuffer, WAV header generation
//! ├── session/      ← CaptureSession, AudioMixer thread, ActivityDrivenScheduler, CaptureLoop
//! ├── storage/      ← WavSinkWriter, ActivityLog (CSV), checksum, metadata sidecar
//! ├── mux/          ← FfmpegMuxer
//! └── analysis/     ← time-per-activity summary of the CSV log, remote video analysis hand-off
//! ```

pub mod analysis;
pub mod models;
pub mod mux;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use analysis::remote::AnalysisRequest;
pub use models::activity::ActivityState;
pub use models::audio_models::{AudioChunk, AudioDeviceInfo, AudioDiagnostics, AudioLevels, AudioSourceKind};
pub use models::config::{CaptureConfiguration, EncoderSettings, ResizeStrategy};
pub use models::error::CaptureError;
pub use models::frame::Frame;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use mux::ffmpeg::FfmpegMuxer;
pub use processing::chunk_mixer::ChunkMixer;
pub use processing::compositor::FrameCompositor;
pub use processing::ring_buffer::RingBuffer;
pub use session::capture_loop::CaptureLoop;
pub use session::capture_session::{CaptureSession, SessionOutcome};
pub use session::scheduler::ActivityDrivenScheduler;
pub use storage::activity_log::ActivityLog;
pub use traits::activity_observer::ActivityObserver;
pub use traits::audio_device::{AudioDeviceProvider, AudioInput};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_source::{ScreenSource, WebcamSource};
pub use traits::muxer::Muxer;
pub use traits::video_analyzer::{RemoteFile, RemoteFileState, VideoAnalyzer};
