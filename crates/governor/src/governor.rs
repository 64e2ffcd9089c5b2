use crate::backoff::Backoff;
use crate::error::{GovernorError, Result};
use crate::window::SlidingWindow;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::sleep_until;

const MINUTE: Duration = Duration::from_millis(60_000);

/// Configuration for a [`Governor`]. Defaults match the reference embedding
/// service: 1500 requests/minute, 10000 chunks/day, 25 concurrent reservations.
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u32,
    pub requests_per_day: u32,
    pub max_concurrency: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 1500,
            tokens_per_minute: 1_000_000,
            requests_per_day: 10_000,
            max_concurrency: 25,
        }
    }
}

/// Outcome of an embedding attempt, reported back to the governor on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    RateLimited,
    Failed,
}

struct DailyCounter {
    date: String,
    used: u32,
    limit: u32,
}

impl DailyCounter {
    fn roll_if_needed(&mut self, today: &str) -> bool {
        if self.date != today {
            self.date = today.to_string();
            self.used = 0;
            true
        } else {
            false
        }
    }
}

struct Inner {
    requests: SlidingWindow,
    tokens: SlidingWindow,
    daily: DailyCounter,
}

/// A reservation held by a caller between `reserve` and `release`. Dropping it
/// without calling `release` is treated as `Outcome::Failed` (see `Drop` impl
/// on the caller side is intentionally not provided: callers must report an
/// outcome explicitly so the token window can be corrected).
pub struct Permit {
    _concurrency: OwnedSemaphorePermit,
    chunks: u32,
}

/// Request-per-minute, token-per-minute, and request-per-day gate in front of
/// the embedder. A rate-limited release escalates a shared backoff that every
/// other pending reservation observes before it is admitted.
pub struct Governor {
    config: GovernorConfig,
    inner: Mutex<Inner>,
    concurrency: Arc<Semaphore>,
    backoff: Backoff,
    backoff_until_epoch_ms: AtomicI64,
}

impl Governor {
    #[must_use]
    pub fn new(config: GovernorConfig) -> Self {
        let today = today_utc();
        let inner = Inner {
            requests: SlidingWindow::new(MINUTE, config.requests_per_minute),
            tokens: SlidingWindow::new(MINUTE, config.tokens_per_minute),
            daily: DailyCounter {
                date: today,
                used: 0,
                limit: config.requests_per_day,
            },
        };
        Self {
            concurrency: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
            inner: Mutex::new(inner),
            backoff: Backoff::new(),
            backoff_until_epoch_ms: AtomicI64::new(0),
        }
    }

    /// Suspend until both per-minute windows admit `chunks`/`estimated_tokens`
    /// and the daily cap is not exhausted, then reserve the slot.
    pub async fn reserve(&self, chunks: u32, estimated_tokens: u32) -> Result<Permit> {
        let concurrency = Arc::clone(&self.concurrency)
            .acquire_owned()
            .await
            .expect("governor semaphore is never closed");

        loop {
            self.wait_out_backoff().await;

            let mut inner = self.inner.lock().await;
            let today = today_utc();
            inner.daily.roll_if_needed(&today);

            if inner.daily.used + chunks > inner.daily.limit {
                return Err(GovernorError::DailyQuotaExhausted {
                    date: inner.daily.date.clone(),
                    used: inner.daily.used,
                    limit: inner.daily.limit,
                });
            }

            let now = Instant::now();
            let req_ready = inner.requests.next_admission(now, chunks);
            let tok_ready = inner.tokens.next_admission(now, estimated_tokens);
            let ready_at = req_ready.max(tok_ready);

            if ready_at <= now {
                inner.requests.record(now, chunks);
                inner.tokens.record(now, estimated_tokens);
                inner.daily.used += chunks;
                return Ok(Permit {
                    _concurrency: concurrency,
                    chunks,
                });
            }

            drop(inner);
            sleep_until(tokio::time::Instant::from_std(ready_at)).await;
        }
    }

    /// Report the outcome of the reserved call, correcting the token window
    /// with the actual usage and, on `RateLimited`, escalating the shared
    /// backoff that subsequent `reserve` calls observe.
    pub async fn release(&self, permit: Permit, actual_tokens: u32, outcome: Outcome) {
        let mut inner = self.inner.lock().await;
        inner.tokens.correct_last(actual_tokens);
        drop(inner);
        drop(permit);

        match outcome {
            Outcome::RateLimited => {
                let wait = self.backoff.escalate();
                let until = chrono::Utc::now().timestamp_millis() + wait.as_millis() as i64;
                self.backoff_until_epoch_ms
                    .fetch_max(until, Ordering::SeqCst);
                log::warn!("governor: rate limited, backing off for {wait:?}");
            }
            Outcome::Ok => self.backoff.reset(),
            Outcome::Failed => {}
        }
    }

    async fn wait_out_backoff(&self) {
        loop {
            let until_ms = self.backoff_until_epoch_ms.load(Ordering::SeqCst);
            let now_ms = Utc::now().timestamp_millis();
            if until_ms <= now_ms {
                return;
            }
            let remaining = Duration::from_millis((until_ms - now_ms).max(0) as u64);
            tokio::time::sleep(remaining).await;
        }
    }

    pub async fn daily_remaining_requests(&self) -> u32 {
        let mut inner = self.inner.lock().await;
        let today = today_utc();
        inner.daily.roll_if_needed(&today);
        inner.daily.limit.saturating_sub(inner.daily.used)
    }

    #[must_use]
    pub fn today_date_utc(&self) -> String {
        today_utc()
    }

    #[must_use]
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }
}

fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl Permit {
    #[must_use]
    pub fn chunks(&self) -> u32 {
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reserve_and_release_round_trip() {
        let governor = Governor::new(GovernorConfig::default());
        let permit = governor.reserve(5, 100).await.unwrap();
        assert_eq!(permit.chunks(), 5);
        governor.release(permit, 90, Outcome::Ok).await;
        assert_eq!(governor.daily_remaining_requests().await, 9_995);
    }

    #[tokio::test]
    async fn daily_quota_exhaustion_returns_error_immediately() {
        let governor = Governor::new(GovernorConfig {
            requests_per_day: 5,
            ..GovernorConfig::default()
        });
        let permit = governor.reserve(5, 10).await.unwrap();
        governor.release(permit, 10, Outcome::Ok).await;
        let err = governor.reserve(1, 10).await.unwrap_err();
        assert!(matches!(err, GovernorError::DailyQuotaExhausted { .. }));
    }

    #[tokio::test]
    async fn today_date_utc_is_iso_date() {
        let governor = Governor::new(GovernorConfig::default());
        let date = governor.today_date_utc();
        assert_eq!(date.len(), 10);
        assert_eq!(date.chars().nth(4), Some('-'));
    }

    #[tokio::test]
    async fn rate_limited_release_sets_backoff_observed_by_next_reserve() {
        let governor = Governor::new(GovernorConfig::default());
        let permit = governor.reserve(1, 1).await.unwrap();
        governor.release(permit, 1, Outcome::RateLimited).await;

        let started = Instant::now();
        let permit2 = governor.reserve(1, 1).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        governor.release(permit2, 1, Outcome::Ok).await;
    }
}
