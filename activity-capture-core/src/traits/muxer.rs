use std::path::Path;

use crate::models::error::CaptureError;
use crate::models::frame::Frame;

/// Combines the frame sequence and an optional audio file into one container.
///
/// Implemented by `FfmpegMuxer`.
pub trait Muxer {
    /// Encode `frames` at a uniform `fps`, attaching `audio` when given.
    ///
    /// Video/audio duration mismatch is accepted as-is.
    fn mux(&self, frames: &[Frame], fps: f64, audio: Option<&Path>, output: &Path) -> Result<(), CaptureError>;

    /// Codec names recorded in the metadata sidecar: `(video, audio)`.
    fn codecs(&self) -> (String, String) {
        ("unknown".into(), "unknown".into())
    }
}
