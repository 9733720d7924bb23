pub mod audio_mixer;
pub mod capture_loop;
pub mod capture_session;
pub mod scheduler;
