use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::models::activity::ActivityState;
use crate::models::error::CaptureError;
use crate::processing::compositor::TIMESTAMP_FORMAT;

pub const LOG_HEADER: [&str; 5] = ["Timestamp", "Application", "Window Title", "URL", "File Path"];

/// Append-only CSV log with one row per activity transition.
///
/// The header is written only when the file is first created, so restarts
/// keep appending to the same history.
pub struct ActivityLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ActivityLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();
        let exists = path.is_file();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create log directory: {}", e)))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CaptureError::StorageError(format!("failed to open {}: {}", path.display(), e)))?;

        let mut log = Self {
            path,
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(file),
        };
        if !exists {
            log.write_record(&LOG_HEADER)?;
        }
        Ok(log)
    }

    /// Append one transition row and flush it.
    pub fn append(&mut self, at: NaiveDateTime, state: &ActivityState) -> Result<(), CaptureError> {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        self.write_record(&[
            timestamp,
            field(&state.application),
            field(&state.window_title),
            field(&state.url),
            field(&state.file_path),
        ])
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record<I, T>(&mut self, record: I) -> Result<(), CaptureError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|e| CaptureError::StorageError(format!("failed to write log row: {}", e)))?;
        self.writer
            .flush()
            .map_err(|e| CaptureError::StorageError(format!("failed to flush log: {}", e)))
    }
}
