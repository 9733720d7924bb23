pub mod activity_observer;
pub mod audio_device;
pub mod capture_delegate;
pub mod capture_source;
pub mod muxer;
pub mod video_analyzer;
