//! cpal audio backend.
//!
//! Opens the system-output loopback and the default microphone as input
//! streams. Device callbacks push into a ring buffer; the audio unit pulls
//! fixed-size chunks with blocking reads, resampled to the session rate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, SupportedStreamConfig};
use log::{info, warn};
use parking_lot::{Condvar, Mutex};

use activity_capture_core::models::audio_models::{AudioChunk, AudioDeviceInfo, AudioSourceKind};
use activity_capture_core::models::error::CaptureError;
use activity_capture_core::processing::chunk_mixer::ChunkMixer;
use activity_capture_core::processing::ring_buffer::RingBuffer;
use activity_capture_core::traits::audio_device::{AudioDeviceProvider, AudioInput};

/// Seconds of device audio buffered between callback and reader.
const BUFFER_SECONDS: usize = 2;

/// Name fragments of input devices that expose the output mix.
#[cfg(not(target_os = "windows"))]
const LOOPBACK_NAME_HINTS: &[&str] = &["monitor", "loopback", "stereo mix"];

/// Device audio shared between the cpal callback thread and the reader.
struct Shared {
    buffer: Mutex<RingBuffer>,
    ready: Condvar,
}

impl Shared {
    fn push(&self, samples: &[f32]) {
        self.buffer.lock().write(samples);
        self.ready.notify_one();
    }
}

/// Opens loopback and microphone inputs on the default cpal host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalAudioProvider;

impl CpalAudioProvider {
    pub fn new() -> Self {
        Self
    }

    /// The default output device, captured through WASAPI loopback.
    #[cfg(target_os = "windows")]
    fn loopback_device(&self) -> Result<(Device, SupportedStreamConfig), CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default output device".into()))?;
        let config = device
            .default_output_config()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("output config: {}", e)))?;
        Ok((device, config))
    }

    /// The first input device whose name marks it as a monitor of the output mix.
    #[cfg(not(target_os = "windows"))]
    fn loopback_device(&self) -> Result<(Device, SupportedStreamConfig), CaptureError> {
        let host = cpal::default_host();
        let device = host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to enumerate input devices: {}", e)))?
            .find(|d| {
                let name = d.name().unwrap_or_default().to_lowercase();
                LOOPBACK_NAME_HINTS.iter().any(|hint| name.contains(hint))
            })
            .ok_or_else(|| CaptureError::DeviceUnavailable("no loopback/monitor input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("loopback config: {}", e)))?;
        Ok((device, config))
    }

    fn microphone_device(&self) -> Result<(Device, SupportedStreamConfig), CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("microphone config: {}", e)))?;
        Ok((device, config))
    }
}

impl AudioDeviceProvider for CpalAudioProvider {
    fn open_loopback(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError> {
        let (device, config) = self.loopback_device()?;
        let input = CpalInput::open(AudioSourceKind::Loopback, &device, config, sample_rate, chunk_frames)?;
        Ok(Box::new(input))
    }

    fn open_microphone(&self, sample_rate: u32, chunk_frames: usize) -> Result<Box<dyn AudioInput>, CaptureError> {
        let (device, config) = self.microphone_device()?;
        let input = CpalInput::open(AudioSourceKind::Microphone, &device, config, sample_rate, chunk_frames)?;
        Ok(Box::new(input))
    }
}

/// A running cpal input stream. The stream stops when this is dropped.
pub struct CpalInput {
    info: AudioDeviceInfo,
    shared: Arc<Shared>,
    mixer: ChunkMixer,
    index: u64,
    read_timeout: Duration,
    _stream: Stream,
}

impl CpalInput {
    fn open(
        source: AudioSourceKind,
        device: &Device,
        config: SupportedStreamConfig,
        sample_rate: u32,
        chunk_frames: usize,
    ) -> Result<Self, CaptureError> {
        let info = AudioDeviceInfo {
            name: device.name().unwrap_or_else(|_| "Unknown Device".to_string()),
            source,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };
        info!(
            "Opening {:?} device '{}': {:?} {}Hz {}ch",
            source,
            info.name,
            config.sample_format(),
            info.sample_rate,
            info.channels
        );

        let shared = Arc::new(Shared {
            buffer: Mutex::new(RingBuffer::new(info.sample_rate as usize * BUFFER_SECONDS, info.channels)),
            ready: Condvar::new(),
        });
        let stream = build_stream(device, &config, Arc::clone(&shared))?;

        let chunk_secs = chunk_frames as f64 / sample_rate.max(1) as f64;
        Ok(Self {
            info,
            shared,
            mixer: ChunkMixer::new(sample_rate as f64),
            index: 0,
            read_timeout: Duration::from_secs_f64(chunk_secs * 2.0),
            _stream: stream,
        })
    }

    /// Device frames needed for `frames` frames at the session rate.
    fn device_frames(&self, frames: usize) -> usize {
        let target = self.mixer.target_sample_rate.max(1.0);
        (frames as f64 * self.info.sample_rate as f64 / target).ceil() as usize
    }
}

impl AudioInput for CpalInput {
    fn info(&self) -> AudioDeviceInfo {
        self.info.clone()
    }

    fn read_chunk(&mut self, frames: usize) -> Result<AudioChunk, CaptureError> {
        let wanted = self.device_frames(frames);
        let deadline = Instant::now() + self.read_timeout;

        let raw = {
            let mut buffer = self.shared.buffer.lock();
            while buffer.frames_available() < wanted {
                if self.shared.ready.wait_until(&mut buffer, deadline).timed_out() {
                    break;
                }
            }
            buffer.read_frames(wanted)
        };

        let rate = self.info.sample_rate as f64;
        let (samples, channels) = match self.info.channels {
            0 => return Err(CaptureError::TransientCapture("device reports zero channels".into())),
            n @ (1 | 2) => (self.mixer.resample(&raw, n as usize, rate), n),
            n => (self.mixer.resample(&ChunkMixer::to_stereo(&raw, n as usize), 2, rate), 2),
        };

        let chunk = AudioChunk::new(self.info.source, self.index, channels, samples);
        self.index += 1;
        Ok(chunk)
    }
}

/// Build and start an input stream, converting every supported sample type
/// to `f32` in the callback.
fn build_stream(device: &Device, config: &SupportedStreamConfig, shared: Arc<Shared>) -> Result<Stream, CaptureError> {
    let stream_config: cpal::StreamConfig = config.config();
    let err_fn = |err: cpal::StreamError| warn!("Audio stream error: {}", err);

    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &_| shared.push(data),
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &_| {
                let samples: Vec<f32> = data.iter().map(|&s| s as f32 / 32_768.0).collect();
                shared.push(&samples);
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &_| {
                let samples: Vec<f32> = data.iter().map(|&s| (s as f32 - 32_768.0) / 32_768.0).collect();
                shared.push(&samples);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to start input stream: {}", e)))?;
    Ok(stream)
}
