//! Deadline-based debouncer driven by an explicit clock.

use std::time::{Duration, Instant};

/// Holds the latest scheduled value until the input has been quiet for
/// `delay`. Scheduling again replaces the value and restarts the wait, so a
/// burst of inputs yields only the last one.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn schedule(&mut self, value: T, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.pending = Some((value, deadline));
        deadline
    }

    /// Drops the pending value so it never fires.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Returns the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.cancel(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_last_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let t0 = Instant::now();

        debouncer.schedule("a", t0);
        debouncer.schedule("ab", t0 + Duration::from_millis(100));
        debouncer.schedule("abc", t0 + Duration::from_millis(200));

        assert_eq!(debouncer.poll(t0 + Duration::from_millis(400)), None);
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(500)), Some("abc"));
        assert_eq!(debouncer.poll(t0 + Duration::from_millis(900)), None);
    }

    #[test]
    fn cancelled_value_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let t0 = Instant::now();
        debouncer.schedule(1, t0);
        assert_eq!(debouncer.cancel(), Some(1));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(t0 + Duration::from_secs(1)), None);
    }
}
