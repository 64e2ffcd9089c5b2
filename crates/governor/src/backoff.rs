use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BASE: Duration = Duration::from_secs(1);
const FACTOR: u32 = 2;
const CAP: Duration = Duration::from_secs(60);
const JITTER_FRACTION: f64 = 0.2;

/// Tracks the shared exponential-backoff attempt count across all reservations
/// on a governor. A single `rate_limited` release escalates the attempt count
/// for everyone currently waiting; a successful release resets it.
#[derive(Default)]
pub struct Backoff {
    attempt: AtomicU32,
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            attempt: AtomicU32::new(0),
        }
    }

    /// Escalate and return the duration the whole governor should now sleep.
    pub fn escalate(&self) -> Duration {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst);
        let exp = FACTOR.saturating_pow(attempt);
        let unjittered = BASE.saturating_mul(exp).min(CAP);
        jitter(unjittered)
    }

    pub fn reset(&self) {
        self.attempt.store(0, Ordering::SeqCst);
    }
}

/// Deterministic-enough jitter (±20%) derived from the wall clock's
/// sub-millisecond component; no cryptographic quality is required here.
fn jitter(base: Duration) -> Duration {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let fraction = (f64::from(nanos % 1000) / 1000.0) * 2.0 - 1.0; // in [-1, 1)
    let offset = base.as_secs_f64() * JITTER_FRACTION * fraction;
    let adjusted = (base.as_secs_f64() + offset).max(0.0);
    Duration::from_secs_f64(adjusted).min(CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalates_geometrically_and_caps() {
        let backoff = Backoff::new();
        let first = backoff.escalate();
        assert!(first >= Duration::from_millis(800) && first <= Duration::from_millis(1200));
        for _ in 0..10 {
            backoff.escalate();
        }
        let capped = backoff.escalate();
        assert!(capped <= CAP);
    }

    #[test]
    fn reset_returns_to_base() {
        let backoff = Backoff::new();
        backoff.escalate();
        backoff.escalate();
        backoff.reset();
        let after_reset = backoff.escalate();
        assert!(after_reset >= Duration::from_millis(800) && after_reset <= Duration::from_millis(1200));
    }
}
