use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;

use crate::models::error::CaptureError;
use crate::processing::compositor::TIMESTAMP_FORMAT;

/// Titles at or above this length are shortened for display.
const MAX_TITLE_LEN: usize = 70;

/// Time attributed to one window or application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub application: String,
    /// `None` for application-level totals.
    pub window_title: Option<String>,
    pub seconds: i64,
}

/// Time spent per window and per application, derived from the activity log.
///
/// Each row is credited with the time until the next row; the last row gets
/// nothing. Entries are sorted by descending duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySummary {
    pub by_window: Vec<UsageEntry>,
    pub by_application: Vec<UsageEntry>,
}

struct Record {
    at: NaiveDateTime,
    application: String,
    window_title: String,
}

/// Summarize the activity log at `path`.
pub fn summarize(path: &Path) -> Result<ActivitySummary, CaptureError> {
    let file = File::open(path)
        .map_err(|e| CaptureError::StorageError(format!("log file not found at {}: {}", path.display(), e)))?;
    summarize_reader(file)
}

/// Summarize CSV log rows from any reader. The first row is the header.
pub fn summarize_reader<R: Read>(reader: R) -> Result<ActivitySummary, CaptureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping unreadable log row: {}", e);
                continue;
            }
        };
        match parse_record(&row) {
            Some(record) => records.push(record),
            None => debug!("Skipping malformed log row: {:?}", row),
        }
    }

    if records.len() < 2 {
        return Err(CaptureError::InvalidState(
            "not enough data to analyze, at least two log entries are required".into(),
        ));
    }

    let mut by_window = Totals::default();
    let mut by_application = Totals::default();
    for pair in records.windows(2) {
        let seconds = (pair[1].at - pair[0].at).num_seconds();
        let current = &pair[0];
        by_window.add((current.application.clone(), Some(current.window_title.clone())), seconds);
        by_application.add((current.application.clone(), None), seconds);
    }

    Ok(ActivitySummary {
        by_window: by_window.into_sorted(),
        by_application: by_application.into_sorted(),
    })
}

fn parse_record(row: &csv::StringRecord) -> Option<Record> {
    let at = NaiveDateTime::parse_from_str(row.get(0)?, TIMESTAMP_FORMAT).ok()?;
    Some(Record {
        at,
        application: row.get(1)?.to_string(),
        window_title: row.get(2)?.to_string(),
    })
}

/// Insertion-ordered accumulator, so equal durations keep first-seen order.
#[derive(Default)]
struct Totals {
    index: HashMap<(String, Option<String>), usize>,
    entries: Vec<UsageEntry>,
}

impl Totals {
    fn add(&mut self, key: (String, Option<String>), seconds: i64) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].seconds += seconds;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(UsageEntry {
            application: key.0,
            window_title: key.1,
            seconds,
        });
    }

    fn into_sorted(mut self) -> Vec<UsageEntry> {
        self.entries.sort_by(|a, b| b.seconds.cmp(&a.seconds));
        self.entries
    }
}

/// Render seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    format!("{}{:02}:{:02}:{:02}", sign, total / 3600, (total % 3600) / 60, total % 60)
}

/// Shorten titles of 70 characters or more to 67 characters plus `...`.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() < MAX_TITLE_LEN {
        return title.to_string();
    }
    let mut short: String = title.chars().take(MAX_TITLE_LEN - 3).collect();
    short.push_str("...");
    short
}

impl fmt::Display for ActivitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Detailed Activity Summary ---")?;
        for entry in &self.by_window {
            writeln!(
                f,
                "[{}] {:<20} - {}",
                format_duration(entry.seconds),
                entry.application,
                truncate_title(entry.window_title.as_deref().unwrap_or(""))
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Application Time Summary ---")?;
        for entry in &self.by_application {
            writeln!(f, "[{}] {}", format_duration(entry.seconds), entry.application)?;
        }
        Ok(())
    }
}
