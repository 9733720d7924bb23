pub mod activity_log;
pub mod checksum;
pub mod metadata;
pub mod wav_writer;
