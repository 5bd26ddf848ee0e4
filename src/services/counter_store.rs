use async_trait::async_trait;

/// Result of a single increment attempt against the shared counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrOutcome {
    /// The store counted the call; carries the post-increment value.
    Counted(u64),
    /// The store could not be reached or answered with something unusable.
    Unavailable,
}

/// Shared atomic counter store used by the daily quota gate.
///
/// Implementations must not fail outward: every problem is reported as
/// [`IncrOutcome::Unavailable`] so the caller can fall back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Establishes the shared connection if needed. Cheap once connected.
    async fn connect(&self);

    /// Atomically increments `key`, setting `ttl_seconds` as its expiry when
    /// the key does not have one yet.
    async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> IncrOutcome;

    async fn health_check(&self) -> bool;
}
