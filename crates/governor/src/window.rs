use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Strict sliding window over the last `span` of wall-clock time, holding
/// `(timestamp, amount)` entries pruned on every admission check.
pub struct SlidingWindow {
    span: Duration,
    limit: u32,
    entries: VecDeque<(Instant, u32)>,
    total: u64,
}

impl SlidingWindow {
    pub fn new(span: Duration, limit: u32) -> Self {
        Self {
            span,
            limit,
            entries: VecDeque::new(),
            total: 0,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&(ts, amount)) = self.entries.front() {
            if now.duration_since(ts) >= self.span {
                self.entries.pop_front();
                self.total -= u64::from(amount);
            } else {
                break;
            }
        }
    }

    /// Whether `amount` more fits under the limit right now, after pruning.
    pub fn admits(&mut self, now: Instant, amount: u32) -> bool {
        self.prune(now);
        self.total + u64::from(amount) <= u64::from(self.limit)
    }

    pub fn record(&mut self, now: Instant, amount: u32) {
        self.entries.push_back((now, amount));
        self.total += u64::from(amount);
    }

    /// Replace the most recently recorded entry's amount (used to correct an
    /// estimated token count with the actual usage reported by the provider).
    pub fn correct_last(&mut self, actual: u32) {
        if let Some(last) = self.entries.back_mut() {
            self.total = self.total - u64::from(last.1) + u64::from(actual);
            last.1 = actual;
        }
    }

    /// Earliest instant at which `amount` would fit, given current entries.
    pub fn next_admission(&mut self, now: Instant, amount: u32) -> Instant {
        self.prune(now);
        if self.total + u64::from(amount) <= u64::from(self.limit) {
            return now;
        }
        // Wait for the oldest entry to age out of the window.
        self.entries
            .front()
            .map(|&(ts, _)| ts + self.span)
            .unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_under_limit() {
        let mut w = SlidingWindow::new(Duration::from_secs(60), 10);
        let now = Instant::now();
        assert!(w.admits(now, 5));
        w.record(now, 5);
        assert!(w.admits(now, 5));
        w.record(now, 5);
        assert!(!w.admits(now, 1));
    }

    #[test]
    fn prunes_expired_entries() {
        let mut w = SlidingWindow::new(Duration::from_millis(10), 10);
        let t0 = Instant::now();
        w.record(t0, 10);
        assert!(!w.admits(t0, 1));
        let t1 = t0 + Duration::from_millis(20);
        assert!(w.admits(t1, 10));
    }

    #[test]
    fn correct_last_adjusts_total() {
        let mut w = SlidingWindow::new(Duration::from_secs(60), 100);
        let now = Instant::now();
        w.record(now, 50);
        w.correct_last(10);
        assert!(w.admits(now, 90));
    }
}
