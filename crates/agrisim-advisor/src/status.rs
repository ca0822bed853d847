//! Connectivity flag and request counters.
//!
//! Updated from request tasks and read from the tick thread, so counters are
//! atomics and the timestamps sit behind a mutex that recovers from poisoning.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use agrisim_types::AdvisoryStatus;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

#[derive(Debug, Default)]
struct Timestamps {
    last_request: Option<DateTime<Utc>>,
    last_probe: Option<Instant>,
}

/// Live status of the advisory service.
#[derive(Debug)]
pub struct StatusTracker {
    connected: AtomicBool,
    has_credential: bool,
    request_count: AtomicU64,
    failure_count: AtomicU64,
    model: String,
    timestamps: Mutex<Timestamps>,
}

impl StatusTracker {
    /// Start disconnected with zeroed counters.
    pub fn new(has_credential: bool, model: impl Into<String>) -> Self {
        Self {
            connected: AtomicBool::new(false),
            has_credential,
            request_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            model: model.into(),
            timestamps: Mutex::new(Timestamps::default()),
        }
    }

    /// Whether the last request or probe succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Whether a credential was configured.
    pub const fn has_credential(&self) -> bool {
        self.has_credential
    }

    /// Count an outgoing request (probes excluded).
    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.with_timestamps(|t| t.last_request = Some(Utc::now()));
    }

    /// A request or probe succeeded.
    pub fn record_success(&self) {
        self.connected.store(true, Ordering::Release);
    }

    /// A request failed; the service is considered unreachable until a
    /// later probe or request succeeds.
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.connected.store(false, Ordering::Release);
    }

    /// A reply arrived but could not be used. Counted as a failure; the
    /// service itself is still reachable.
    pub fn record_malformed(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// A probe failed. Not counted, since probes are not requests.
    pub fn record_disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    /// Note that a probe is starting now.
    pub fn mark_probed(&self) {
        self.with_timestamps(|t| t.last_probe = Some(Instant::now()));
    }

    /// Claim the right to probe if none happened within `interval`.
    ///
    /// Returns `true` at most once per interval, so concurrent callers never
    /// probe together.
    pub fn claim_probe(&self, interval: Duration) -> bool {
        self.with_timestamps(|t| {
            let now = Instant::now();
            let due = t
                .last_probe
                .is_none_or(|last| now.saturating_duration_since(last) >= interval);
            if due {
                t.last_probe = Some(now);
            }
            due
        })
    }

    /// Read-only snapshot for collaborators.
    pub fn snapshot(&self) -> AdvisoryStatus {
        AdvisoryStatus {
            connected: self.is_connected(),
            has_credential: self.has_credential,
            request_count: self.request_count.load(Ordering::Relaxed),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            last_request_time: self.with_timestamps(|t| t.last_request),
            model: self.model.clone(),
        }
    }

    fn with_timestamps<R>(&self, f: impl FnOnce(&mut Timestamps) -> R) -> R {
        let mut guard = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}
