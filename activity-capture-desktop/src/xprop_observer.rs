//! Foreground-window observer for X11 desktops, built on the `xprop` tool.

use std::fs;
use std::process::Command;

use log::debug;

use activity_capture_core::models::activity::ActivityState;
use activity_capture_core::traits::activity_observer::ActivityObserver;

/// Properties of the active window as reported by `xprop -id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowProps {
    pub title: Option<String>,
    /// Instance part of `WM_CLASS`.
    pub class: Option<String>,
    pub pid: Option<u32>,
}

/// Reads the focused window's title and owning process through `xprop`.
///
/// Any failure (no X server, no focused window, missing tool) yields
/// `ActivityState::unreadable()`.
#[derive(Debug, Clone)]
pub struct XpropObserver {
    program: String,
}

impl Default for XpropObserver {
    fn default() -> Self {
        Self {
            program: "xprop".into(),
        }
    }
}

impl XpropObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, args: &[&str]) -> Option<String> {
        let output = Command::new(&self.program).args(args).output().ok()?;
        if !output.status.success() {
            debug!("{} {:?} exited with {}", self.program, args, output.status);
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn active_window(&self) -> Option<ActivityState> {
        let root = self.run(&["-root", "_NET_ACTIVE_WINDOW"])?;
        let id = parse_active_window(&root)?;
        let props = parse_window_props(&self.run(&["-id", &id, "_NET_WM_NAME", "WM_CLASS", "_NET_WM_PID"])?);

        let application = props.pid.and_then(process_name).or(props.class)?;
        Some(ActivityState::from_window(application, props.title.unwrap_or_default()))
    }
}

impl ActivityObserver for XpropObserver {
    fn observe(&mut self) -> ActivityState {
        self.active_window().unwrap_or_else(ActivityState::unreadable)
    }
}

/// Window id from `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007`.
///
/// `0x0` means nothing is focused.
pub fn parse_active_window(output: &str) -> Option<String> {
    let id = output.split('#').nth(1)?.split(',').next()?.trim();
    if id.is_empty() || id == "0x0" {
        return None;
    }
    Some(id.to_string())
}

pub fn parse_window_props(output: &str) -> WindowProps {
    let mut props = WindowProps::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(" = ") else {
            continue;
        };
        if key.starts_with("_NET_WM_NAME") {
            props.title = Some(unquote(value));
        } else if key.starts_with("WM_CLASS") {
            props.class = value.split(", ").next().map(unquote);
        } else if key.starts_with("_NET_WM_PID") {
            props.pid = value.trim().parse().ok();
        }
    }
    props
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Executable name of a process, from `/proc/<pid>/comm`.
fn process_name(pid: u32) -> Option<String> {
    let name = fs::read_to_string(format!("/proc/{}/comm", pid)).ok()?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
