//! Restart-on-keystroke debounce for free-text city search.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<String>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record the latest text and push the deadline out by a full delay.
    pub fn input(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some(query.into());
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled query once the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("Pa", start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("Pa".to_string()));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn each_keystroke_restarts_the_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("P", start);
        debouncer.input("Pa", start + Duration::from_millis(200));
        debouncer.input("Par", start + Duration::from_millis(400));

        assert_eq!(debouncer.poll(start + Duration::from_millis(600)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(700))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(700)),
            Some("Par".to_string())
        );
    }

    #[test]
    fn cancel_drops_pending_text() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("Lyon", start);
        debouncer.cancel();
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(start + DELAY), None);
    }
}
