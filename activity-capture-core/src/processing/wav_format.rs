//! WAV (RIFF, PCM) header layout for the audio sink.

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size field.
pub const RIFF_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size field.
pub const DATA_SIZE_OFFSET: u64 = 40;

/// PCM stream parameters of a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl WavSpec {
    /// Interleaved stereo 16-bit PCM, the sink format.
    pub fn stereo_16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            bit_depth: 16,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(spec: WavSpec, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&spec.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&spec.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&spec.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Parse a header produced by [`generate_wav_header`].
///
/// Returns the `WavSpec` and the declared data size, or `None` if the bytes are
/// not a PCM WAV header.
pub fn parse_wav_header(header: &[u8]) -> Option<(WavSpec, u32)> {
    if header.len() < WAV_HEADER_SIZE || &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return None;
    }
    if &header[12..16] != b"fmt " || &header[36..40] != b"data" {
        return None;
    }
    let u16_at = |i: usize| u16::from_le_bytes([header[i], header[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);

    if u16_at(20) != 1 {
        return None;
    }
    let spec = WavSpec {
        sample_rate: u32_at(24),
        channels: u16_at(22),
        bit_depth: u16_at(34),
    };
    Some((spec, u32_at(40)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_magic_and_size() {
        let header = generate_wav_header(WavSpec::stereo_16(48000), 0);
        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_48khz_stereo_16bit() {
        let header = generate_wav_header(WavSpec::stereo_16(48000), 9600);

        let byte_rate = u32::from_le_bytes([header[28], header[29], header[30], header[31]]);
        assert_eq!(byte_rate, 192000);
        let block_align = u16::from_le_bytes([header[32], header[33]]);
        assert_eq!(block_align, 4);
        let chunk_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        assert_eq!(chunk_size, 36 + 9600);
    }

    #[test]
    fn parse_reads_back_spec() {
        let spec = WavSpec::stereo_16(44100);
        let header = generate_wav_header(spec, 400);
        assert_eq!(parse_wav_header(&header), Some((spec, 400)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_wav_header(b"not a wav"), None);
        let mut header = generate_wav_header(WavSpec::stereo_16(48000), 0);
        header[20] = 3; // IEEE float
        assert_eq!(parse_wav_header(&header), None);
    }
}
