use std::time::{Duration, Instant};

use log::debug;

use crate::models::activity::ActivityState;
use crate::traits::activity_observer::ActivityObserver;

/// What the capture loop should do after one poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerDecision {
    /// Set on a genuine activity transition; the new state to log.
    pub transition: Option<ActivityState>,
    /// Start a session first (transition while not recording).
    pub start_recording: bool,
    /// Capture exactly one frame this poll.
    pub capture: bool,
}

/// Decides when to capture: on every activity transition, and otherwise at a
/// minimum cadence while recording.
///
/// Polled cooperatively from the capture loop; never runs on its own thread.
pub struct ActivityDrivenScheduler<O: ActivityObserver> {
    observer: O,
    last_state: Option<ActivityState>,
    last_capture: Option<Instant>,
    capture_interval: Duration,
}

impl<O: ActivityObserver> ActivityDrivenScheduler<O> {
    pub fn new(observer: O, capture_interval: Duration) -> Self {
        Self {
            observer,
            last_state: None,
            last_capture: None,
            capture_interval,
        }
    }

    pub fn last_state(&self) -> Option<&ActivityState> {
        self.last_state.as_ref()
    }

    /// Observe once and decide. `recording` is the session's state before
    /// this poll.
    ///
    /// A transition takes priority over the periodic tick; at most one
    /// capture is requested per poll either way.
    pub fn poll(&mut self, now: Instant, recording: bool) -> SchedulerDecision {
        let state = self.observer.observe();

        let mut decision = SchedulerDecision::default();
        if !state.is_valid() {
            debug!("Ignoring unreadable activity sample");
        } else if self.last_state.as_ref() != Some(&state) {
            self.last_state = Some(state.clone());
            decision.transition = Some(state);
            decision.start_recording = !recording;
            decision.capture = true;
        }

        if !decision.capture && recording {
            decision.capture = match self.last_capture {
                Some(last) => now.saturating_duration_since(last) >= self.capture_interval,
                None => true,
            };
        }

        if decision.capture {
            self.last_capture = Some(now);
        }
        decision
    }
}
