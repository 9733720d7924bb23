use chrono::NaiveDateTime;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use super::glyphs;
use crate::models::config::{CaptureConfiguration, ResizeStrategy};

/// Format of the burned-in timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Gap between the webcam overlay and the timestamp below it.
const TIMESTAMP_GAP: i64 = 5;

const TIMESTAMP_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Where the overlays land on a frame of a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    /// Top-left of the webcam region; may be negative when the webcam is
    /// wider than the frame (the blit clips).
    pub webcam_origin: Option<(i64, i64)>,
    pub timestamp_origin: (i64, i64),
    pub timestamp_size: (u32, u32),
}

/// Builds one output frame from a desktop snapshot and an optional webcam
/// snapshot: resize, top-right webcam overlay, timestamp burn-in.
///
/// Pure apart from the timestamp, which is passed in by the caller.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    resize: ResizeStrategy,
    webcam_scale: f32,
    webcam_margin: u32,
    timestamp_scale: u32,
}

impl FrameCompositor {
    pub fn new(config: &CaptureConfiguration) -> Self {
        Self {
            resize: config.resize,
            webcam_scale: config.webcam_scale,
            webcam_margin: config.webcam_margin,
            timestamp_scale: config.timestamp_scale,
        }
    }

    /// Output frame size for a screen of `width` x `height`.
    ///
    /// Both dimensions are rounded down to even, as yuv420p requires.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (0, 0);
        }
        let (new_width, new_height) = match self.resize {
            ResizeStrategy::TargetHeight(target) => ((width as u64 * target as u64 / height as u64) as u32, target),
            ResizeStrategy::Scale(scale) => ((width as f32 * scale) as u32, (height as f32 * scale) as u32),
        };
        ((new_width - new_width % 2).max(2), (new_height - new_height % 2).max(2))
    }

    /// Scaled size of a webcam snapshot.
    pub fn webcam_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            (width as f32 * self.webcam_scale) as u32,
            (height as f32 * self.webcam_scale) as u32,
        )
    }

    pub fn layout(&self, frame_width: u32, webcam_size: Option<(u32, u32)>, text: &str) -> OverlayLayout {
        let margin = self.webcam_margin as i64;
        let timestamp_size = glyphs::text_size(text, self.timestamp_scale);

        match webcam_size {
            Some((webcam_width, webcam_height)) => {
                let x = frame_width as i64 - webcam_width as i64 - margin;
                let y = margin;
                OverlayLayout {
                    webcam_origin: Some((x, y)),
                    timestamp_origin: (x.max(0), y + webcam_height as i64 + TIMESTAMP_GAP),
                    timestamp_size,
                }
            }
            None => OverlayLayout {
                webcam_origin: None,
                timestamp_origin: ((frame_width as i64 - timestamp_size.0 as i64 - margin).max(0), margin),
                timestamp_size,
            },
        }
    }

    pub fn resize_screen(&self, screen: &RgbImage) -> RgbImage {
        let (width, height) = self.output_size(screen.width(), screen.height());
        if (width, height) == screen.dimensions() {
            return screen.clone();
        }
        imageops::resize(screen, width, height, FilterType::Triangle)
    }

    pub fn timestamp_text(at: NaiveDateTime) -> String {
        at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Compose one frame. Regions that would fall outside the frame are
    /// clipped rather than rejected.
    pub fn compose(&self, screen: &RgbImage, webcam: Option<&RgbImage>, at: NaiveDateTime) -> RgbImage {
        let mut frame = self.resize_screen(screen);

        let webcam = webcam
            .map(|cam| {
                let (width, height) = self.webcam_size(cam.width(), cam.height());
                (cam, width, height)
            })
            .filter(|(_, width, height)| *width > 0 && *height > 0)
            .map(|(cam, width, height)| imageops::resize(cam, width, height, FilterType::Triangle));

        let text = Self::timestamp_text(at);
        let layout = self.layout(frame.width(), webcam.as_ref().map(|w| w.dimensions()), &text);

        if let (Some(overlay), Some((x, y))) = (webcam.as_ref(), layout.webcam_origin) {
            imageops::replace(&mut frame, overlay, x, y);
        }

        let (x, y) = layout.timestamp_origin;
        glyphs::draw_text(&mut frame, &text, x, y, self.timestamp_scale, TIMESTAMP_COLOR);
        frame
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
    }

    fn compositor(resize: ResizeStrategy) -> FrameCompositor {
        FrameCompositor::new(&CaptureConfiguration {
            resize,
            ..Default::default()
        })
    }

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn target_height_forces_even_width() {
        let c = compositor(ResizeStrategy::TargetHeight(480));
        assert_eq!(c.output_size(1920, 1080), (852, 480));
        // 1366 * 480 / 768 = 853.75 → 853 → 852
        assert_eq!(c.output_size(1366, 768), (852, 480));
        assert_eq!(c.output_size(1000, 480), (1000, 480));
    }

    #[test]
    fn odd_target_height_is_rounded_down_to_even() {
        let c = compositor(ResizeStrategy::TargetHeight(481));
        // 1920 * 481 / 1080 = 855.1 → 854
        assert_eq!(c.output_size(1920, 1080), (854, 480));
    }

    #[test]
    fn scale_mode_uses_fraction() {
        let c = compositor(ResizeStrategy::Scale(0.5));
        assert_eq!(c.output_size(1920, 1080), (960, 540));
        assert_eq!(c.output_size(1001, 601), (500, 300));
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(FrameCompositor::timestamp_text(at()), "2024-05-06 07:08:09");
    }

    #[test]
    fn no_webcam_matches_resized_screen_outside_timestamp() {
        let c = compositor(ResizeStrategy::TargetHeight(240));
        let screen = solid(640, 480, 40);

        let frame = c.compose(&screen, None, at());
        let resized = c.resize_screen(&screen);
        assert_eq!(frame.dimensions(), resized.dimensions());

        let layout = c.layout(frame.width(), None, &FrameCompositor::timestamp_text(at()));
        let (tx, ty) = layout.timestamp_origin;
        let (tw, th) = layout.timestamp_size;
        let inside = |x: u32, y: u32| {
            (x as i64) >= tx && (x as i64) < tx + tw as i64 && (y as i64) >= ty && (y as i64) < ty + th as i64
        };

        let mut differing_inside = 0;
        for (x, y, pixel) in frame.enumerate_pixels() {
            if inside(x, y) {
                if pixel != resized.get_pixel(x, y) {
                    differing_inside += 1;
                }
            } else {
                assert_eq!(pixel, resized.get_pixel(x, y), "pixel ({x}, {y}) changed");
            }
        }
        assert!(differing_inside > 0, "timestamp was not drawn");
    }

    #[test]
    fn webcam_is_blitted_top_right() {
        let c = compositor(ResizeStrategy::TargetHeight(480));
        let screen = solid(640, 480, 0);
        let webcam = RgbImage::from_pixel(200, 100, Rgb([10, 200, 30]));

        let frame = c.compose(&screen, Some(&webcam), at());

        // 200 * 0.35 = 70, 100 * 0.35 = 35; origin = (640 - 70 - 20, 20)
        assert_eq!(frame.get_pixel(550, 20), &Rgb([10, 200, 30]));
        assert_eq!(frame.get_pixel(619, 54), &Rgb([10, 200, 30]));
        assert_eq!(frame.get_pixel(549, 20), &Rgb([0, 0, 0]));
        assert_eq!(frame.get_pixel(620, 20), &Rgb([0, 0, 0]));

        let layout = c.layout(640, Some((70, 35)), "x");
        assert_eq!(layout.webcam_origin, Some((550, 20)));
        assert_eq!(layout.timestamp_origin, (550, 20 + 35 + 5));
    }

    #[test]
    fn oversized_webcam_is_clipped() {
        let c = FrameCompositor::new(&CaptureConfiguration {
            resize: ResizeStrategy::TargetHeight(100),
            webcam_scale: 1.0,
            ..Default::default()
        });
        let screen = solid(200, 100, 0);
        let webcam = solid(400, 300, 90);

        let frame = c.compose(&screen, Some(&webcam), at());

        assert_eq!(frame.dimensions(), (200, 100));
        assert_eq!(frame.get_pixel(0, 99), &Rgb([90, 90, 90]));
    }

    #[test]
    fn compose_is_deterministic_for_fixed_clock() {
        let c = compositor(ResizeStrategy::Scale(0.5));
        let screen = solid(300, 200, 120);
        assert_eq!(c.compose(&screen, None, at()), c.compose(&screen, None, at()));
    }
}
