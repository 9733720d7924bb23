use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use log::{info, warn};

use super::capture_session::{CaptureSession, SessionOutcome};
use super::scheduler::ActivityDrivenScheduler;
use crate::models::error::CaptureError;
use crate::storage::activity_log::ActivityLog;
use crate::traits::activity_observer::ActivityObserver;
use crate::traits::capture_source::ScreenSource;
use crate::traits::muxer::Muxer;

/// Upper bound on how long the loop sleeps before re-checking the stop flag.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// The single-threaded main loop: poll the scheduler, log transitions,
/// start the session and capture frames until the stop flag is set.
pub struct CaptureLoop<O: ActivityObserver, S: ScreenSource, M: Muxer> {
    scheduler: ActivityDrivenScheduler<O>,
    session: CaptureSession<S, M>,
    log: ActivityLog,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
}

impl<O: ActivityObserver, S: ScreenSource, M: Muxer> CaptureLoop<O, S, M> {
    pub fn new(observer: O, session: CaptureSession<S, M>, log: ActivityLog, stop: Arc<AtomicBool>) -> Self {
        let capture_interval = session.config().capture_interval();
        let poll_interval = session.config().poll_interval();
        Self {
            scheduler: ActivityDrivenScheduler::new(observer, capture_interval),
            poll_interval,
            session,
            log,
            stop,
        }
    }

    pub fn session(&self) -> &CaptureSession<S, M> {
        &self.session
    }

    /// Run until the stop flag is set, then stop and save the session.
    ///
    /// Only setup failures end the loop early; everything else is logged
    /// and the next poll proceeds.
    pub fn run(&mut self) -> Result<SessionOutcome, CaptureError> {
        info!("Watching activity (poll every {:?})", self.poll_interval);
        while !self.stop.load(Ordering::SeqCst) {
            self.step(Instant::now())?;
            self.sleep_until_next_poll();
        }
        info!("Stop requested, finishing session");
        self.session.finish()
    }

    /// One poll of the loop at time `now`.
    pub fn step(&mut self, now: Instant) -> Result<(), CaptureError> {
        let decision = self.scheduler.poll(now, self.session.is_recording());

        if let Some(ref state) = decision.transition {
            info!(
                "Activity: {} | {}",
                state.application.as_deref().unwrap_or(""),
                state.window_title.as_deref().unwrap_or("")
            );
            if let Err(e) = self.log.append(Local::now().naive_local(), state) {
                warn!("Failed to log activity: {}", e);
            }
        }

        if decision.start_recording {
            self.session.start()?;
        }

        if decision.capture && self.session.is_recording() {
            if let Err(e) = self.session.capture_frame() {
                warn!("Frame capture skipped: {}", e);
            }
        }
        Ok(())
    }

    fn sleep_until_next_poll(&self) {
        let deadline = Instant::now() + self.poll_interval;
        while !self.stop.load(Ordering::SeqCst) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}
