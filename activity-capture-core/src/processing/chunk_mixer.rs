use crate::models::audio_models::AudioChunk;

/// Pure-math chunk aligner, mixer and resampler.
///
/// All operations work on interleaved `f32` buffers with no device
/// dependencies. Output format is interleaved stereo:
/// `out[i] = (loopback[i] + mic[i]) / 2`, then folded to two channels.
#[derive(Debug, Clone)]
pub struct ChunkMixer {
    pub target_sample_rate: f64,
}

/// Two chunks truncated to their common frame count and channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub frames: usize,
    pub channels: usize,
    pub first: Vec<f32>,
    pub second: Vec<f32>,
}

impl ChunkMixer {
    pub fn new(target_sample_rate: f64) -> Self {
        Self { target_sample_rate }
    }

    /// Truncate both chunks to the shorter frame count and the smaller
    /// channel count. Returns `None` when the overlap is empty.
    pub fn align(first: &AudioChunk, second: &AudioChunk) -> Option<AlignedPair> {
        let frames = first.frames().min(second.frames());
        let channels = first.channels.min(second.channels) as usize;
        if frames == 0 || channels == 0 {
            return None;
        }

        let take = |chunk: &AudioChunk| {
            let stride = chunk.channels as usize;
            let mut out = Vec::with_capacity(frames * channels);
            for frame in chunk.samples.chunks_exact(stride).take(frames) {
                out.extend_from_slice(&frame[..channels]);
            }
            out
        };

        Some(AlignedPair {
            frames,
            channels,
            first: take(first),
            second: take(second),
        })
    }

    /// Mix a loopback chunk with a microphone chunk.
    ///
    /// Returns interleaved stereo for the overlapping frames only, or an
    /// empty buffer when either side delivered nothing.
    pub fn mix(&self, loopback: &AudioChunk, mic: &AudioChunk) -> Vec<f32> {
        let Some(pair) = Self::align(loopback, mic) else {
            return Vec::new();
        };

        let averaged: Vec<f32> = pair
            .first
            .iter()
            .zip(&pair.second)
            .map(|(a, b)| (a + b) / 2.0)
            .collect();

        Self::to_stereo(&averaged, pair.channels)
    }

    /// Fold interleaved audio to stereo: mono is duplicated, channels past
    /// the second are dropped.
    pub fn to_stereo(samples: &[f32], channels: usize) -> Vec<f32> {
        match channels {
            0 => Vec::new(),
            1 => samples.iter().flat_map(|&s| [s, s]).collect(),
            2 => samples.to_vec(),
            n => samples
                .chunks_exact(n)
                .flat_map(|frame| [frame[0], frame[1]])
                .collect(),
        }
    }

    /// Quantize to little-endian `i16` bytes, saturating outside `[-1.0, 1.0]`.
    ///
    /// Scaling is symmetric, so `-1.0` lands on `-32767`.
    pub fn convert_to_int16_pcm(&self, samples: &[f32]) -> Vec<u8> {
        samples
            .iter()
            .flat_map(|s| ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes())
            .collect()
    }

    /// Bring interleaved audio recorded at `source_rate` to the session rate
    /// by linear interpolation between neighbouring frames.
    ///
    /// Rates closer than 0.01 Hz are treated as equal and copied through.
    pub fn resample(&self, samples: &[f32], channels: usize, source_rate: f64) -> Vec<f32> {
        let channels = channels.max(1);
        let frames = samples.len() / channels;
        if frames == 0 || (source_rate - self.target_sample_rate).abs() < 0.01 {
            return samples.to_vec();
        }

        let step = source_rate / self.target_sample_rate;
        let out_frames = (frames as f64 * self.target_sample_rate / source_rate) as usize;
        let mut out = Vec::with_capacity(out_frames * channels);
        for i in 0..out_frames {
            let pos = i as f64 * step;
            let index = (pos as usize).min(frames - 1);
            let next = (index + 1).min(frames - 1);
            let t = (pos - index as f64) as f32;
            for ch in 0..channels {
                let a = samples[index * channels + ch];
                let b = samples[next * channels + ch];
                out.push(a + (b - a) * t);
            }
        }
        out
    }

    /// Root-mean-square level; silence and empty buffers give 0.0.
    pub fn rms_level(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    pub fn peak_level(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::models::audio_models::AudioSourceKind;

    fn loopback(channels: u16, samples: Vec<f32>) -> AudioChunk {
        AudioChunk::new(AudioSourceKind::Loopback, 0, channels, samples)
    }

    fn mic(channels: u16, samples: Vec<f32>) -> AudioChunk {
        AudioChunk::new(AudioSourceKind::Microphone, 0, channels, samples)
    }

    #[test]
    fn mix_averages_stereo_pairs() {
        let mixer = ChunkMixer::new(48000.0);
        let result = mixer.mix(&loopback(2, vec![0.2, 0.4, 0.6, 0.8]), &mic(2, vec![0.0, 0.0, 0.2, 0.2]));

        assert_eq!(result.len(), 4);
        assert_relative_eq!(result[0], 0.1, epsilon = 1e-6);
        assert_relative_eq!(result[1], 0.2, epsilon = 1e-6);
        assert_relative_eq!(result[2], 0.4, epsilon = 1e-6);
        assert_relative_eq!(result[3], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn mix_emits_only_overlapping_frames() {
        let mixer = ChunkMixer::new(48000.0);
        // 3 stereo frames vs 1 stereo frame
        let result = mixer.mix(&loopback(2, vec![0.5; 6]), &mic(2, vec![0.5, 0.5]));
        assert_eq!(result.len(), 2);

        // Mic longer than loopback
        let result = mixer.mix(&loopback(2, vec![0.5; 4]), &mic(2, vec![0.5; 10]));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn zero_overlap_emits_nothing() {
        let mixer = ChunkMixer::new(48000.0);
        assert!(mixer.mix(&loopback(2, vec![]), &mic(1, vec![0.3; 5])).is_empty());
        assert!(mixer.mix(&loopback(2, vec![0.3; 8]), &mic(1, vec![])).is_empty());
        assert!(mixer.mix(&loopback(0, vec![0.3; 8]), &mic(1, vec![0.3])).is_empty());
    }

    #[test]
    fn channel_mismatch_uses_smaller_count_then_duplicates_mono() {
        let mixer = ChunkMixer::new(48000.0);
        // Loopback stereo, mic mono: first loopback channel is averaged with mic.
        let result = mixer.mix(&loopback(2, vec![0.4, 0.9, 0.8, 0.9]), &mic(1, vec![0.0, 0.2]));

        assert_eq!(result.len(), 4);
        assert_relative_eq!(result[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(result[1], 0.2, epsilon = 1e-6);
        assert_relative_eq!(result[2], 0.5, epsilon = 1e-6);
        assert_relative_eq!(result[3], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn more_than_two_channels_keeps_first_two() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(ChunkMixer::to_stereo(&samples, 3), vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn align_truncates_frames_and_channels() {
        let pair = ChunkMixer::align(&loopback(3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), &mic(2, vec![7.0, 8.0])).unwrap();

        assert_eq!(pair.frames, 1);
        assert_eq!(pair.channels, 2);
        assert_eq!(pair.first, vec![1.0, 2.0]);
        assert_eq!(pair.second, vec![7.0, 8.0]);
    }

    #[test]
    fn convert_to_int16_pcm() {
        let mixer = ChunkMixer::new(48000.0);
        let samples = [0.0f32, 1.0, -1.0, 0.5];

        let pcm = mixer.convert_to_int16_pcm(&samples);

        assert_eq!(pcm.len(), 8);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 0);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), i16::MAX);
        // -1.0 → -32767 (not -32768 due to the symmetric scale)
        assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), -i16::MAX);
    }

    #[test]
    fn convert_clamps_out_of_range() {
        let mixer = ChunkMixer::new(48000.0);
        let pcm = mixer.convert_to_int16_pcm(&[2.0f32, -3.0]);

        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -i16::MAX);
    }

    #[test]
    fn resample_same_rate_is_passthrough() {
        let mixer = ChunkMixer::new(48000.0);
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(mixer.resample(&samples, 1, 48000.0), samples);
    }

    #[test]
    fn resample_upsample_2x() {
        let mixer = ChunkMixer::new(48000.0);
        let result = mixer.resample(&[0.0, 1.0], 1, 24000.0);

        assert_eq!(result.len(), 4);
        assert_relative_eq!(result[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(result[1], 0.5, epsilon = 1e-6);
        // past the last source frame the final value is held
        assert_relative_eq!(result[3], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn resample_keeps_channels_interleaved() {
        let mixer = ChunkMixer::new(24000.0);
        let samples: Vec<f32> = (0..200).map(|i| i as f32 / 200.0).collect();

        let result = mixer.resample(&samples, 2, 48000.0);

        // 100 stereo frames at 48kHz → 50 at 24kHz
        assert_eq!(result.len(), 100);
        // channels stay separate: frame 1 comes from source frame 2
        assert_relative_eq!(result[2], 4.0 / 200.0, epsilon = 1e-6);
        assert_relative_eq!(result[3], 5.0 / 200.0, epsilon = 1e-6);
    }

    #[test]
    fn levels() {
        assert_eq!(ChunkMixer::rms_level(&[0.0, 0.0]), 0.0);
        assert_relative_eq!(ChunkMixer::rms_level(&[1.0, 1.0, 1.0]), 1.0, epsilon = 1e-6);
        assert_relative_eq!(ChunkMixer::peak_level(&[0.1, -0.5, 0.3]), 0.5, epsilon = 1e-6);
    }
}
