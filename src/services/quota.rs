//! Per-user daily quota gate.
//!
//! Every call to [`QuotaService::take_daily`] counts against the
//! `(kind, user, UTC day)` counter, whether or not it is allowed. The shared
//! counter store is tried once per call; when it cannot answer in time the
//! call is counted in the process-local [`LocalCounters`] instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::services::{
    clock::{Clock, SystemClock},
    counter_store::{CounterStore, IncrOutcome},
    local_counters::LocalCounters,
};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuotaError {
    #[error("user id must not be blank")]
    BlankUserId,

    #[error("action kind must not be blank")]
    BlankKind,

    #[error("daily limit must not be negative (got {0})")]
    NegativeLimit(i64),
}

/// Which counter answered a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    Store,
    Local,
}

impl CounterBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterBackend::Store => "store",
            CounterBackend::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyQuota {
    pub ok: bool,
    pub remaining: u64,
    pub count: u64,
    pub backend: CounterBackend,
}

impl DailyQuota {
    fn evaluate(count: u64, limit: u64, backend: CounterBackend) -> Self {
        Self {
            ok: count <= limit,
            remaining: limit.saturating_sub(count),
            count,
            backend,
        }
    }
}

pub struct QuotaService {
    store: Arc<dyn CounterStore>,
    fallback: Arc<LocalCounters>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl QuotaService {
    pub fn new(store: Arc<dyn CounterStore>, fallback: Arc<LocalCounters>) -> Self {
        Self {
            store,
            fallback,
            clock: Arc::new(SystemClock),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Counts one action of `kind` for `user_id` today and decides whether it
    /// fits under `limit_per_day`.
    ///
    /// The decision uses the post-increment count, so the call that crosses
    /// the limit is rejected but still counted. Store failures never surface;
    /// only invalid input is an error, and it is reported before anything is
    /// counted.
    pub async fn take_daily(
        &self,
        user_id: &str,
        kind: &str,
        limit_per_day: i64,
    ) -> Result<DailyQuota, QuotaError> {
        let limit = validate_input(user_id, kind, limit_per_day)?;

        let now = self.clock.now();
        let day = day_key(now);
        let ttl_seconds = seconds_until_end_of_day(now);
        let key = counter_key(kind, user_id, &day);

        let quota = match self.increment_in_store(&key, ttl_seconds).await {
            IncrOutcome::Counted(count) => DailyQuota::evaluate(count, limit, CounterBackend::Store),
            IncrOutcome::Unavailable => {
                warn!(kind, user_id, "counter store unavailable, counting locally");
                let count = self.fallback.take(kind, user_id, &day);
                DailyQuota::evaluate(count, limit, CounterBackend::Local)
            }
        };

        debug!(
            kind,
            user_id,
            day = %day,
            count = quota.count,
            limit,
            ok = quota.ok,
            backend = quota.backend.as_str(),
            "daily quota checked"
        );

        Ok(quota)
    }

    // One bounded attempt; no retries.
    async fn increment_in_store(&self, key: &str, ttl_seconds: u64) -> IncrOutcome {
        let attempt = async {
            self.store.connect().await;
            self.store.incr_with_ttl(key, ttl_seconds).await
        };

        match tokio::time::timeout(self.store_timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    key,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "counter store timed out"
                );
                IncrOutcome::Unavailable
            }
        }
    }
}

fn validate_input(user_id: &str, kind: &str, limit_per_day: i64) -> Result<u64, QuotaError> {
    if user_id.trim().is_empty() {
        return Err(QuotaError::BlankUserId);
    }
    if kind.trim().is_empty() {
        return Err(QuotaError::BlankKind);
    }
    u64::try_from(limit_per_day).map_err(|_| QuotaError::NegativeLimit(limit_per_day))
}

/// `YYYY-MM-DD` of `now` in UTC.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub fn counter_key(kind: &str, user_id: &str, day: &str) -> String {
    format!("rl:{}:{}:{}", kind, user_id, day)
}

/// Start of the UTC day after `now`.
pub fn next_day_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Whole seconds left in the UTC day, never less than 1.
pub fn seconds_until_end_of_day(now: DateTime<Utc>) -> u64 {
    next_day_start(now)
        .map(|midnight| (midnight - now).num_seconds().max(1) as u64)
        .unwrap_or(1)
}
