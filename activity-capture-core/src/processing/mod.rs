pub mod chunk_mixer;
pub mod compositor;
pub mod glyphs;
pub mod ring_buffer;
pub mod wav_format;
