use std::sync::Arc;

use crate::models::audio_models::{AudioChunk, AudioDeviceInfo};
use crate::models::error::CaptureError;

/// An opened audio device delivering fixed-size chunks with blocking reads.
///
/// Not required to be `Send`: inputs are opened and used on the audio thread.
pub trait AudioInput {
    fn info(&self) -> AudioDeviceInfo;

    /// Block until up to `frames` frames are available and return them.
    ///
    /// May under-deliver (including zero frames). Errors are per-chunk and
    /// never end the recording on their own.
    fn read_chunk(&mut self, frames: usize) -> Result<AudioChunk, CaptureError>;
}

/// Opens the two live devices used by the audio unit.
///
/// Implemented by `CpalAudioProvider` in the desktop crate.
pub trait AudioDeviceProvider: Send + Sync {
    /// Open the system-output loopback as an input stream.
    fn open_loopback(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError>;

    /// Open the default microphone.
    fn open_microphone(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError>;
}

impl<T: AudioDeviceProvider + ?Sized> AudioDeviceProvider for Arc<T> {
    fn open_loopback(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError> {
        (**self).open_loopback(sample_rate, chunk_frames)
    }

    fn open_microphone(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError> {
        (**self).open_microphone(sample_rate, chunk_frames)
    }
}
