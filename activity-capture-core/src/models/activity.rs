use serde::{Deserialize, Serialize};

/// Process names (lowercase, without extension) whose window title starts
/// with the edited file's path.
const EDITOR_PROCESSES: &[&str] = &["code", "notepad++", "sublime_text", "notepad", "gedit", "kate"];

/// Foreground application/window sample produced by an activity observer.
///
/// Two states are equal iff all four fields match. A missing application
/// marks an unreadable sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityState {
    pub application: Option<String>,
    pub window_title: Option<String>,
    pub url: Option<String>,
    pub file_path: Option<String>,
}

impl ActivityState {
    /// The all-`None` sample observers return on error.
    pub fn unreadable() -> Self {
        Self::default()
    }

    /// Build a state from a foreground process name and window title,
    /// deriving the edited file path for known editors.
    pub fn from_window(application: impl Into<String>, window_title: impl Into<String>) -> Self {
        let application = application.into();
        let window_title = window_title.into();

        let process = application.to_lowercase();
        let process = process.strip_suffix(".exe").unwrap_or(&process);
        let file_path = if EDITOR_PROCESSES.contains(&process) {
            window_title
                .split_once(" - ")
                .map(|(path, _)| path.to_string())
        } else {
            None
        };

        Self {
            application: Some(application),
            window_title: Some(window_title),
            url: None,
            file_path,
        }
    }

    /// Whether this sample may trigger a transition.
    pub fn is_valid(&self) -> bool {
        self.application.is_some()
    }
}
