//! Trailing-edge debouncer driven by explicit instants

use std::time::{Duration, Instant};

/// Holds the latest value until `window` has passed without a newer push
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    /// Replace any pending value and restart the window at `now`
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    /// Take the pending value once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_burst_collapses_to_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        for i in 0..5u64 {
            debouncer.push(i, start + Duration::from_millis(i * 50));
            assert_eq!(debouncer.poll(start + Duration::from_millis(i * 50 + 10)), None);
        }

        // Last push at 200ms, so nothing fires before 500ms
        assert_eq!(debouncer.poll(start + Duration::from_millis(499)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some(4));
        assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push("a", start);
        assert_eq!(debouncer.deadline(), Some(start + WINDOW));
        assert_eq!(debouncer.cancel(), Some("a"));
        assert!(debouncer.deadline().is_none());
        assert_eq!(debouncer.poll(start + WINDOW * 2), None);
    }

    #[test]
    fn test_zero_window_fires_on_next_poll() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.push(1, start);
        assert_eq!(debouncer.poll(start), Some(1));
    }
}
