use serde::{Deserialize, Serialize};

/// Which live device a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceKind {
    Loopback,
    Microphone,
}

/// An opened audio device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub source: AudioSourceKind,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A block of interleaved f32 samples read from one device in one call.
///
/// Consumed immediately by the mixer and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub source: AudioSourceKind,
    /// Arrival index of this chunk for its source, starting at 0.
    pub index: u64,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioChunk {
    pub fn new(source: AudioSourceKind, index: u64, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            source,
            index,
            channels,
            samples,
        }
    }

    /// Number of whole frames in the chunk.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Last observed audio levels (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub loopback_level: f32,
    pub mic_level: f32,
    pub peak_loopback_level: f32,
    pub peak_mic_level: f32,
}

/// Diagnostics for debugging the audio unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioDiagnostics {
    pub chunks_mixed: u64,
    pub chunks_skipped: u64,
    pub chunk_errors: u64,
    pub bytes_written: u64,
    pub loopback_format: String,
    pub mic_format: String,
    pub levels: AudioLevels,
}
