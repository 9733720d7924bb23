use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, WavSpec, DATA_SIZE_OFFSET, RIFF_SIZE_OFFSET, WAV_HEADER_SIZE};

/// Largest data chunk a RIFF header can declare (the RIFF size field is
/// `36 + data`).
pub const MAX_DATA_BYTES: u64 = (u32::MAX - 36) as u64;

/// Append-only WAV sink written by the audio unit.
///
/// Writes past [`MAX_DATA_BYTES`] are dropped, so a very long session keeps
/// its first ~6 hours of 48 kHz stereo audio with a valid header.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, sizes patched on close]
/// [interleaved 16-bit PCM data...]
/// ```
pub struct WavSinkWriter {
    file_path: PathBuf,
    spec: WavSpec,
    file: Option<BufWriter<File>>,
    data_bytes: u64,
    full: bool,
}

impl WavSinkWriter {
    /// Create the file (truncating any previous sink) and write the header.
    pub fn open(file_path: impl Into<PathBuf>, spec: WavSpec) -> Result<Self, CaptureError> {
        let file_path = file_path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        let mut file = BufWriter::new(file);

        // data size placeholder, patched on close
        let header = wav_format::generate_wav_header(spec, 0);
        file.write_all(&header)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;

        Ok(Self {
            file_path,
            spec,
            file: Some(file),
            data_bytes: 0,
            full: false,
        })
    }

    /// Append little-endian PCM bytes.
    ///
    /// Once the sink is full only the whole frames that still fit are kept.
    pub fn write(&mut self, pcm: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open for writing".into()))?;

        let room = MAX_DATA_BYTES - self.data_bytes.min(MAX_DATA_BYTES);
        let pcm = if pcm.len() as u64 > room {
            if !self.full {
                self.full = true;
                warn!(
                    "WAV sink {} reached the {} byte RIFF limit, dropping further audio",
                    self.file_path.display(),
                    MAX_DATA_BYTES
                );
            }
            let block = u64::from(self.spec.block_align().max(1));
            &pcm[..(room - room % block) as usize]
        } else {
            pcm
        };

        file.write_all(pcm)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.data_bytes += pcm.len() as u64;
        Ok(())
    }

    /// Patch the RIFF and data sizes, flush and close. Returns the PCM byte count.
    ///
    /// Errors if the sink was already closed.
    pub fn close(&mut self) -> Result<u64, CaptureError> {
        let writer = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let mut file = writer
            .into_inner()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e)))?;

        let data_size = u32::try_from(self.data_bytes.min(MAX_DATA_BYTES)).unwrap_or(u32::MAX - 36);
        file.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        file.write_all(&data_size.saturating_add(36).to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        file.seek(SeekFrom::Start(DATA_SIZE_OFFSET))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        file.write_all(&data_size.to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        file.sync_all().map_err(|e| CaptureError::StorageError(e.to_string()))?;
        Ok(self.data_bytes)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// PCM bytes written so far (excluding the header).
    pub fn bytes_written(&self) -> u64 {
        self.data_bytes
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// Declared PCM data length of a finalized sink, or `None` if the file is
/// missing or not a WAV file.
pub fn wav_data_len(path: &Path) -> Option<u32> {
    let mut header = [0u8; WAV_HEADER_SIZE];
    File::open(path).ok()?.read_exact(&mut header).ok()?;
    wav_format::parse_wav_header(&header).map(|(_, len)| len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("activity_capture_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn write_and_close_patches_sizes() {
        let path = temp_file_path("sink.wav");
        let mut writer = WavSinkWriter::open(&path, WavSpec::stereo_16(48000)).unwrap();

        writer.write(&[0u8; 16]).unwrap();
        writer.write(&[1u8; 8]).unwrap();
        assert_eq!(writer.close().unwrap(), 24);

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 44 + 24);
        let (spec, len) = wav_format::parse_wav_header(&data).unwrap();
        assert_eq!(spec, WavSpec::stereo_16(48000));
        assert_eq!(len, 24);
        let riff = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(riff, 36 + 24);
        assert_eq!(wav_data_len(&path), Some(24));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn close_is_single_shot() {
        let path = temp_file_path("close_twice.wav");
        let mut writer = WavSinkWriter::open(&path, WavSpec::stereo_16(48000)).unwrap();

        assert!(writer.close().is_ok());
        assert!(!writer.is_open());
        assert!(matches!(writer.close(), Err(CaptureError::StorageError(_))));
        assert!(writer.write(&[0u8; 4]).is_err());
        assert_eq!(wav_data_len(&path), Some(0));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn oversized_sink_closes_with_saturated_header() {
        let path = temp_file_path("oversized.wav");
        let mut writer = WavSinkWriter::open(&path, WavSpec::stereo_16(48000)).unwrap();
        writer.data_bytes = (1 << 32) + 100;

        assert_eq!(writer.close().unwrap(), (1 << 32) + 100);

        let data = fs::read(&path).unwrap();
        let riff = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(riff, u32::MAX);
        assert_eq!(wav_data_len(&path), Some(u32::MAX - 36));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn close_near_the_limit_does_not_overflow() {
        let path = temp_file_path("near_limit.wav");
        let mut writer = WavSinkWriter::open(&path, WavSpec::stereo_16(48000)).unwrap();
        writer.data_bytes = u64::from(u32::MAX - 10);

        assert!(writer.close().is_ok());
        assert_eq!(wav_data_len(&path), Some(u32::MAX - 36));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn writes_stop_at_the_riff_limit_on_a_frame_boundary() {
        let path = temp_file_path("full.wav");
        let mut writer = WavSinkWriter::open(&path, WavSpec::stereo_16(48000)).unwrap();
        // 6 bytes of room: one 4-byte stereo frame fits
        writer.data_bytes = MAX_DATA_BYTES - 6;

        writer.write(&[7u8; 8]).unwrap();
        assert_eq!(writer.bytes_written(), MAX_DATA_BYTES - 2);
        writer.write(&[7u8; 8]).unwrap();
        assert_eq!(writer.bytes_written(), MAX_DATA_BYTES - 2);
        writer.close().unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 4);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_has_no_data_len() {
        assert_eq!(wav_data_len(&temp_file_path("does_not_exist.wav")), None);
    }
}
