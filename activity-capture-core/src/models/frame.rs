use chrono::{DateTime, Local};
use image::RgbImage;

/// One composited RGB frame, owned by the session until handed to the muxer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
    /// Position in the session's frame sequence, starting at 0.
    pub sequence: u64,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
