use agtimeline_types::Snapshot;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::PollerSettings;
use crate::{Error, Result};

/// What the caller should do on this poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Start a fetch and give up after `timeout`
    Fetch { timeout: Duration },
    /// Next attempt is due after this delay
    Wait(Duration),
    /// A fetch is already running
    InFlight,
}

/// Snapshot polling state: one fetch at a time, exponential back-off on failure.
///
/// The last good snapshot stays available while fetches fail.
#[derive(Debug)]
pub struct SnapshotPoller {
    settings: PollerSettings,
    in_flight: bool,
    consecutive_failures: u32,
    next_due: Option<Instant>,
    cached: Option<Arc<Snapshot>>,
    last_error: Option<String>,
}

impl SnapshotPoller {
    pub fn new(settings: PollerSettings) -> Self {
        Self {
            settings,
            in_flight: false,
            consecutive_failures: 0,
            next_due: None,
            cached: None,
            last_error: None,
        }
    }

    pub fn poll(&mut self, now: Instant) -> PollDecision {
        if self.in_flight {
            return PollDecision::InFlight;
        }
        if let Some(due) = self.next_due
            && due > now
        {
            return PollDecision::Wait(due - now);
        }
        self.in_flight = true;
        PollDecision::Fetch {
            timeout: Duration::from_millis(self.settings.timeout_ms),
        }
    }

    pub fn complete_success(&mut self, now: Instant, snapshot: Snapshot) -> Arc<Snapshot> {
        if self.consecutive_failures > 0 {
            debug!(
                failures = self.consecutive_failures,
                "snapshot fetch recovered"
            );
        }
        self.in_flight = false;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.next_due = Some(now + self.current_interval());

        let snapshot = Arc::new(snapshot);
        self.cached = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn complete_failure(&mut self, now: Instant, error: impl Display) {
        self.in_flight = false;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.current_interval();
        self.next_due = Some(now + delay);
        self.last_error = Some(error.to_string());

        warn!(
            failures = self.consecutive_failures,
            retry_in_ms = delay.as_millis() as u64,
            error = %error,
            "snapshot fetch failed"
        );
    }

    /// Base interval doubled per consecutive failure, capped at the maximum
    pub fn current_interval(&self) -> Duration {
        let base = self.settings.interval_ms.max(1);
        let cap = self.settings.max_interval_ms.max(base);
        let factor = 1u64.checked_shl(self.consecutive_failures).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor).min(cap))
    }

    /// Last good snapshot, possibly stale
    pub fn cached(&self) -> Option<&Arc<Snapshot>> {
        self.cached.as_ref()
    }

    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Forget failures and cached data; the next poll fetches immediately
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.consecutive_failures = 0;
        self.next_due = None;
        self.cached = None;
        self.last_error = None;
    }

    /// Run one attempt if one is due, bounded by the per-attempt timeout.
    ///
    /// Returns the fresh snapshot, or None when no attempt was due or the
    /// attempt failed (the cached snapshot stays available). Dropping the
    /// returned future mid-fetch counts as a failed attempt.
    pub async fn attempt<F, Fut>(&mut self, fetch: F) -> Option<Arc<Snapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Snapshot>>,
    {
        let PollDecision::Fetch { timeout } = self.poll(Instant::now()) else {
            return None;
        };

        let mut guard = AttemptGuard {
            poller: self,
            settled: false,
        };

        let outcome = match tokio::time::timeout(timeout, fetch()).await {
            Ok(result) => result,
            Err(_) => Err(Error::InvalidOperation(format!(
                "snapshot fetch timed out after {} ms",
                timeout.as_millis()
            ))),
        };

        guard.settled = true;
        match outcome {
            Ok(snapshot) => Some(guard.poller.complete_success(Instant::now(), snapshot)),
            Err(err) => {
                guard.poller.complete_failure(Instant::now(), &err);
                None
            }
        }
    }
}

/// Settles an attempt whose future was dropped before the fetch finished
struct AttemptGuard<'a> {
    poller: &'a mut SnapshotPoller,
    settled: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.poller
                .complete_failure(Instant::now(), "snapshot fetch cancelled");
        }
    }
}
