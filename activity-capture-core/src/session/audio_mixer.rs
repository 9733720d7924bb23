use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::models::audio_models::{AudioChunk, AudioDeviceInfo, AudioDiagnostics};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::processing::chunk_mixer::ChunkMixer;
use crate::processing::wav_format::WavSpec;
use crate::storage::wav_writer::WavSinkWriter;
use crate::traits::audio_device::{AudioDeviceProvider, AudioInput};

/// How the audio unit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioOutcome {
    /// The sink was finalized with `bytes` of PCM data.
    Recorded { path: PathBuf, bytes: u64 },
    /// A device or the sink could not be set up; the session has no audio.
    Disabled(String),
}

/// The audio unit: pulls fixed-size chunks from the loopback and microphone,
/// mixes them, and streams 16-bit stereo PCM to the WAV sink.
///
/// ```text
/// [loopback] ─ read_chunk ─┐
///                          ├→ align → average → stereo → int16 → [WavSinkWriter]
/// [microphone] ─ read_chunk┘
/// ```
///
/// Both devices are opened on the audio thread and dropped when it exits.
/// Stop is observed between chunk reads, never mid-read.
pub struct AudioMixer {
    provider: Arc<dyn AudioDeviceProvider>,
    mixer: ChunkMixer,
    sample_rate: u32,
    chunk_frames: usize,
    chunk_duration: Duration,
    sink_path: PathBuf,
    diagnostics: Arc<Mutex<AudioDiagnostics>>,
}

impl AudioMixer {
    pub fn new(
        provider: Arc<dyn AudioDeviceProvider>,
        config: &CaptureConfiguration,
        diagnostics: Arc<Mutex<AudioDiagnostics>>,
    ) -> Self {
        Self {
            provider,
            mixer: ChunkMixer::new(config.sample_rate as f64),
            sample_rate: config.sample_rate,
            chunk_frames: config.chunk_frames(),
            chunk_duration: config.chunk_duration(),
            sink_path: config.temp_audio_path.clone(),
            diagnostics,
        }
    }

    /// Run the mixer on a dedicated `audio-mixer` thread until `stop` is set.
    pub fn spawn(self, stop: Arc<AtomicBool>) -> Result<thread::JoinHandle<AudioOutcome>, CaptureError> {
        thread::Builder::new()
            .name("audio-mixer".into())
            .spawn(move || self.run(&stop))
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to spawn audio thread: {}", e)))
    }

    /// Blocking body of the audio unit.
    pub fn run(&self, stop: &AtomicBool) -> AudioOutcome {
        let mut loopback = match self.provider.open_loopback(self.sample_rate, self.chunk_frames) {
            Ok(device) => device,
            Err(e) => {
                warn!("Loopback audio unavailable, recording without audio: {}", e);
                return AudioOutcome::Disabled(e.to_string());
            }
        };
        let mut mic = match self.provider.open_microphone(self.sample_rate, self.chunk_frames) {
            Ok(device) => device,
            Err(e) => {
                warn!("Microphone unavailable, recording without audio: {}", e);
                return AudioOutcome::Disabled(e.to_string());
            }
        };

        {
            let mut d = self.diagnostics.lock();
            d.loopback_format = describe(&loopback.info());
            d.mic_format = describe(&mic.info());
        }

        let mut sink = match WavSinkWriter::open(&self.sink_path, WavSpec::stereo_16(self.sample_rate)) {
            Ok(sink) => sink,
            Err(e) => {
                error!("Failed to open audio sink {}: {}", self.sink_path.display(), e);
                return AudioOutcome::Disabled(e.to_string());
            }
        };

        info!(
            "Audio recording started: {} + {} -> {}",
            loopback.info().name,
            mic.info().name,
            self.sink_path.display()
        );

        while !stop.load(Ordering::SeqCst) {
            let Some(loopback_chunk) = self.read(loopback.as_mut()) else {
                continue;
            };
            let Some(mic_chunk) = self.read(mic.as_mut()) else {
                continue;
            };
            self.process(&loopback_chunk, &mic_chunk, &mut sink);
        }

        // Devices are released here, before the sink is finalized.
        drop(loopback);
        drop(mic);

        match sink.close() {
            Ok(bytes) => {
                info!("Audio recording stopped: {} bytes of PCM", bytes);
                AudioOutcome::Recorded {
                    path: self.sink_path.clone(),
                    bytes,
                }
            }
            Err(e) => {
                error!("Failed to finalize audio sink: {}", e);
                AudioOutcome::Disabled(e.to_string())
            }
        }
    }

    fn read(&self, device: &mut dyn AudioInput) -> Option<AudioChunk> {
        match device.read_chunk(self.chunk_frames) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                debug!("Audio chunk read failed, skipping: {}", e);
                self.diagnostics.lock().chunk_errors += 1;
                // a device failing instantly must not spin the thread
                thread::sleep(self.chunk_duration);
                None
            }
        }
    }

    fn process(&self, loopback: &AudioChunk, mic: &AudioChunk, sink: &mut WavSinkWriter) {
        let mixed = self.mixer.mix(loopback, mic);

        let mut d = self.diagnostics.lock();
        d.levels.loopback_level = ChunkMixer::rms_level(&loopback.samples);
        d.levels.peak_loopback_level = ChunkMixer::peak_level(&loopback.samples);
        d.levels.mic_level = ChunkMixer::rms_level(&mic.samples);
        d.levels.peak_mic_level = ChunkMixer::peak_level(&mic.samples);

        if mixed.is_empty() {
            d.chunks_skipped += 1;
            return;
        }

        let pcm = self.mixer.convert_to_int16_pcm(&mixed);
        match sink.write(&pcm) {
            Ok(()) => {
                d.chunks_mixed += 1;
                d.bytes_written = sink.bytes_written();
            }
            Err(e) => {
                warn!("Failed to write audio chunk: {}", e);
                d.chunk_errors += 1;
            }
        }
    }
}

fn describe(info: &AudioDeviceInfo) -> String {
    format!("{}: {}Hz/{}ch", info.name, info.sample_rate, info.channels)
}
