use std::sync::Mutex;

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct DayCount {
    day: String,
    count: u64,
}

/// Process-local daily counters used while the shared store is unreachable.
///
/// Counts are keyed by `(kind, user)` and carry the day they belong to; an
/// entry from an earlier day starts over on its next use, and entries from
/// earlier days are dropped once a later day is first seen. Nothing here is
/// shared between processes.
#[derive(Debug, Default)]
pub struct LocalCounters {
    entries: DashMap<(String, String), DayCount>,
    latest_day: Mutex<String>,
}

impl LocalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one call for `(kind, user)` on `day` and returns the new count.
    pub fn take(&self, kind: &str, user_id: &str, day: &str) -> u64 {
        self.prune_before(day);

        // The entry guard holds the shard lock for the whole reset/increment.
        let mut entry = self
            .entries
            .entry((kind.to_string(), user_id.to_string()))
            .or_insert_with(|| DayCount {
                day: day.to_string(),
                count: 0,
            });

        if entry.day != day {
            entry.day = day.to_string();
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count
    }

    // Must not run while an entry guard is held: `retain` locks every shard.
    fn prune_before(&self, day: &str) {
        {
            let mut latest = self
                .latest_day
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if day <= latest.as_str() {
                return;
            }
            *latest = day.to_string();
        }

        self.entries.retain(|_, entry| entry.day.as_str() >= day);
    }

    /// Current count for `(kind, user)` on `day`, without counting.
    pub fn peek(&self, kind: &str, user_id: &str, day: &str) -> u64 {
        self.entries
            .get(&(kind.to_string(), user_id.to_string()))
            .filter(|entry| entry.day == day)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
