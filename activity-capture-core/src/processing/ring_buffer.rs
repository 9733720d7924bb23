/// Circular buffer of interleaved audio samples, read in whole frames.
///
/// Device callbacks write into it and the audio unit drains it one chunk at
/// a time. Wrap in `Arc<parking_lot::Mutex<RingBuffer>>` for cross-thread
/// access.
///
/// Overflow behavior: drops the oldest frames and counts them.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<f32>,
    channels: usize,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    dropped_frames: u64,
}

impl RingBuffer {
    /// Create a buffer holding `capacity_frames` frames of `channels` samples.
    pub fn new(capacity_frames: usize, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let capacity = capacity_frames.max(1) * channels;
        Self {
            buffer: vec![0.0; capacity],
            channels,
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
            dropped_frames: 0,
        }
    }

    /// Write interleaved samples. A trailing partial frame is ignored.
    ///
    /// If the buffer overflows, the oldest frames are dropped. If `samples`
    /// alone exceeds capacity, only the newest `capacity` samples are kept.
    pub fn write(&mut self, samples: &[f32]) {
        let whole = samples.len() - samples.len() % self.channels;
        let mut samples = &samples[..whole];
        if samples.is_empty() {
            return;
        }

        if samples.len() > self.capacity {
            let skipped = samples.len() - self.capacity;
            self.dropped_frames += (skipped / self.channels) as u64;
            samples = &samples[skipped..];
        }

        let overflow = (self.available + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            self.dropped_frames += (overflow / self.channels) as u64;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += samples.len();
    }

    /// Read and remove up to `frames` whole frames.
    pub fn read_frames(&mut self, frames: usize) -> Vec<f32> {
        let to_read = (frames * self.channels).min(self.available);
        if to_read == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(to_read);
        for i in 0..to_read {
            result.push(self.buffer[(self.read_index + i) % self.capacity]);
        }
        self.read_index = (self.read_index + to_read) % self.capacity;
        self.available -= to_read;
        result
    }

    /// Whole frames currently available.
    pub fn frames_available(&self) -> usize {
        self.available / self.channels
    }

    pub fn channels(&self) -> u16 {
        self.channels as u16
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Frames lost to overflow since creation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}
