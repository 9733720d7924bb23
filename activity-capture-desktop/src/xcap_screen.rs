//! Primary-monitor screenshots via xcap.

use image::RgbImage;
use log::{info, warn};
use xcap::Monitor;

use activity_capture_core::models::error::CaptureError;
use activity_capture_core::traits::capture_source::ScreenSource;

use crate::convert::rgba_to_rgb;

/// Captures the primary monitor, or the first monitor when none is marked
/// primary.
pub struct XcapScreen {
    monitor: Option<Monitor>,
}

impl XcapScreen {
    pub fn primary() -> Self {
        let monitors = match Monitor::all() {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("Failed to enumerate monitors: {}", e);
                Vec::new()
            }
        };

        let primary = monitors.iter().position(|m| m.is_primary().unwrap_or(false));
        let monitor = match primary {
            Some(i) => monitors.into_iter().nth(i),
            None => monitors.into_iter().next(),
        };

        if let Some(ref m) = monitor {
            info!("Capturing monitor '{}'", m.name().unwrap_or_default());
        }
        Self { monitor }
    }
}

impl ScreenSource for XcapScreen {
    fn is_available(&self) -> bool {
        self.monitor.is_some()
    }

    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        let monitor = self
            .monitor
            .as_ref()
            .ok_or_else(|| CaptureError::SetupFailure("no monitor available".into()))?;
        let rgba = monitor
            .capture_image()
            .map_err(|e| CaptureError::TransientCapture(format!("screen capture failed: {}", e)))?;

        rgba_to_rgb(rgba.width(), rgba.height(), rgba.as_raw())
            .ok_or_else(|| CaptureError::TransientCapture("unexpected screenshot buffer size".into()))
    }
}
