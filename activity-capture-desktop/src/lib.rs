//! # activity-capture-desktop
//!
//! Desktop device backends for activity-capture.
//!
//! Provides:
//! - `CpalAudioProvider`: loopback + microphone inputs via cpal (feature `cpal-audio`)
//! - `XcapScreen`: primary monitor snapshots via xcap (feature `xcap-screen`)
//! - `NokhwaWebcam`: default camera via nokhwa (feature `nokhwa-webcam`)
//! - `XpropObserver`: X11 foreground window via `xprop` (always built)
//!
//! ## Platform Requirements
//! - Loopback: WASAPI on Windows; elsewhere an input device exposing the
//!   output mix (e.g. a PulseAudio/PipeWire "Monitor of ..." source)
//! - `xprop` on `PATH` for the activity observer
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use activity_capture_core::{CaptureConfiguration, CaptureSession, FfmpegMuxer};
//! use activity_capture_desktop::{CpalAudioProvider, XcapScreen};
//!
//! let config = CaptureConfiguration::default();
//! let muxer = FfmpegMuxer::new(config.encoder.clone());
//! let session = CaptureSession::new(config, XcapScreen::primary(), muxer)
//!     .with_audio(Arc::new(CpalAudioProvider::new()));
//! ```

pub mod convert;
pub mod xprop_observer;

#[cfg(feature = "cpal-audio")]
pub mod cpal_audio;
#[cfg(feature = "nokhwa-webcam")]
pub mod nokhwa_webcam;
#[cfg(feature = "xcap-screen")]
pub mod xcap_screen;

#[cfg(feature = "cpal-audio")]
pub use cpal_audio::CpalAudioProvider;
#[cfg(feature = "nokhwa-webcam")]
pub use nokhwa_webcam::NokhwaWebcam;
#[cfg(feature = "xcap-screen")]
pub use xcap_screen::XcapScreen;
pub use xprop_observer::XpropObserver;
