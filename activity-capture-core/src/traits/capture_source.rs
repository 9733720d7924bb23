use image::RgbImage;

use crate::models::error::CaptureError;

/// A desktop snapshot source.
///
/// Implemented by `XcapScreen` in the desktop crate.
pub trait ScreenSource {
    /// Whether any display surface can be captured at all.
    fn is_available(&self) -> bool;

    /// Grab one RGB snapshot of the screen.
    ///
    /// Failures are reported as `TransientCapture`; the caller skips the tick.
    fn grab(&mut self) -> Result<RgbImage, CaptureError>;
}

/// A webcam snapshot source, acquired at session start and released once at stop.
pub trait WebcamSource {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Release the device. Called exactly once by the session.
    fn release(&mut self);
}
