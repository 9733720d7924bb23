//! Webcam snapshots via nokhwa.

use image::RgbImage;
use log::{info, warn};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use activity_capture_core::models::error::CaptureError;
use activity_capture_core::traits::capture_source::WebcamSource;

pub struct NokhwaWebcam {
    camera: Camera,
    released: bool,
}

impl NokhwaWebcam {
    /// Open camera `index` and start streaming RGB frames.
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let mut camera = Camera::new(
            CameraIndex::Index(index),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        )
        .map_err(|e| CaptureError::DeviceUnavailable(format!("camera {}: {}", index, e)))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("camera {} stream: {}", index, e)))?;

        info!("Webcam opened: {} ({})", camera.info().human_name(), camera.resolution());
        Ok(Self {
            camera,
            released: false,
        })
    }
}

impl WebcamSource for NokhwaWebcam {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.released {
            return Err(CaptureError::DeviceUnavailable("webcam released".into()));
        }
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::TransientCapture(format!("webcam frame: {}", e)))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::TransientCapture(format!("webcam decode: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CaptureError::TransientCapture("unexpected webcam buffer size".into()))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop webcam stream: {}", e);
        }
    }
}

impl Drop for NokhwaWebcam {
    fn drop(&mut self) {
        self.release();
    }
}
