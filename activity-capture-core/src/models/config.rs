use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// How the desktop snapshot is scaled before compositing.
///
/// Either a fixed output height (width follows the aspect ratio) or a fixed
/// fraction of the native size. Target heights must be even.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStrategy {
    TargetHeight(u32),
    Scale(f32),
}

impl Default for ResizeStrategy {
    fn default() -> Self {
        Self::TargetHeight(480)
    }
}

/// Encoder settings handed to the muxer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Path or name of the `ffmpeg` executable.
    pub ffmpeg_path: String,
    pub video_codec: String,
    /// Constant rate factor (lower = higher quality, larger file).
    pub crf: String,
    /// Encoding speed vs. compression trade-off (e.g. `ultrafast`, `medium`, `slow`).
    pub preset: String,
    pub audio_codec: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".into(),
            video_codec: "libx265".into(),
            crf: "28".into(),
            preset: "medium".into(),
            audio_codec: "aac".into(),
        }
    }
}

/// Configuration for a capture session.
///
/// Loaded once before a session starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Playback frame rate of the encoded video (default: 0.2, one frame per 5 s).
    pub fps: f64,

    /// How often the capture loop polls the activity observer.
    pub poll_interval_ms: u64,

    /// Minimum capture cadence while recording, independent of activity.
    pub capture_interval_ms: u64,

    pub resize: ResizeStrategy,

    /// Webcam overlay size as a fraction of the camera's native size.
    pub webcam_scale: f32,

    /// Inset of the webcam overlay from the top-right corner, in pixels.
    pub webcam_margin: u32,

    pub enable_webcam: bool,

    pub enable_audio: bool,

    /// Audio sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Length of one audio chunk read from each device.
    pub chunk_duration_ms: u64,

    /// Integer scale of the burned-in timestamp glyphs.
    pub timestamp_scale: u32,

    pub encoder: EncoderSettings,

    /// Directory where encoded videos are written.
    pub output_directory: PathBuf,

    /// Well-known path of the temporary audio sink.
    pub temp_audio_path: PathBuf,

    pub activity_log_path: PathBuf,
}

impl CaptureConfiguration {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid configuration: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fps.is_nan() || self.fps <= 0.0 {
            return Err("fps must be positive".into());
        }
        if self.poll_interval_ms == 0 || self.capture_interval_ms == 0 {
            return Err("poll and capture intervals must be positive".into());
        }
        match self.resize {
            ResizeStrategy::TargetHeight(0) => return Err("target height must be positive".into()),
            ResizeStrategy::TargetHeight(h) if h % 2 != 0 => {
                return Err(format!("target height must be even for yuv420p encoding: {}", h));
            }
            ResizeStrategy::Scale(s) if s.is_nan() || s <= 0.0 || s > 1.0 => {
                return Err(format!("resize scale out of range: {}", s));
            }
            _ => {}
        }
        if self.webcam_scale.is_nan() || self.webcam_scale <= 0.0 || self.webcam_scale > 1.0 {
            return Err(format!("webcam scale out of range: {}", self.webcam_scale));
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.chunk_duration_ms == 0 {
            return Err("chunk duration must be positive".into());
        }
        if self.timestamp_scale == 0 {
            return Err("timestamp scale must be positive".into());
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms)
    }

    pub fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_duration_ms)
    }

    /// Frames per audio chunk (100 ms at 48 kHz = 4800).
    pub fn chunk_frames(&self) -> usize {
        (self.sample_rate as u64 * self.chunk_duration_ms / 1000) as usize
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            fps: 0.2,
            poll_interval_ms: 1000,
            capture_interval_ms: 5000,
            resize: ResizeStrategy::default(),
            webcam_scale: 0.35,
            webcam_margin: 20,
            enable_webcam: true,
            enable_audio: true,
            sample_rate: 48000,
            chunk_duration_ms: 100,
            timestamp_scale: 2,
            encoder: EncoderSettings::default(),
            output_directory: PathBuf::from("output/videos"),
            temp_audio_path: PathBuf::from("temp_audio.wav"),
            activity_log_path: PathBuf::from("activity_log.csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CaptureConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_frames(), 4800);
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let config = CaptureConfiguration {
            resize: ResizeStrategy::Scale(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            webcam_scale: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_odd_target_height() {
        let config: CaptureConfiguration = serde_json::from_str(r#"{ "resize": { "target_height": 481 } }"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("even"), "{}", err);

        let config = CaptureConfiguration {
            resize: ResizeStrategy::TargetHeight(720),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_fps() {
        let config = CaptureConfiguration {
            fps: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "fps": 1.0, "resize": { "scale": 0.5 }, "encoder": { "crf": "23" } }"#;
        let config: CaptureConfiguration = serde_json::from_str(json).unwrap();

        assert_eq!(config.fps, 1.0);
        assert_eq!(config.resize, ResizeStrategy::Scale(0.5));
        assert_eq!(config.encoder.crf, "23");
        assert_eq!(config.encoder.preset, "medium");
        assert_eq!(config.sample_rate, 48000);
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("activity_capture_test_missing_config.json");
        let err = CaptureConfiguration::load(&path).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }
}
