use crate::models::activity::ActivityState;

/// Foreground application/window inspection.
///
/// Synchronous and bounded by OS-call latency. Returns
/// `ActivityState::unreadable()` on any error rather than failing.
pub trait ActivityObserver {
    fn observe(&mut self) -> ActivityState;
}
