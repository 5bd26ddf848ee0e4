use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::services::quota::{CounterBackend, DailyQuota};

pub struct MetricsService {
    registry: Registry,
    quota_decisions: IntCounterVec,
    store_fallbacks: IntCounter,
}

impl MetricsService {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let quota_decisions = IntCounterVec::new(
            Opts::new("quota_decisions_total", "Daily quota decisions by kind, backend and outcome"),
            &["kind", "backend", "outcome"],
        )?;
        let store_fallbacks = IntCounter::new(
            "quota_store_fallbacks_total",
            "Quota checks counted locally because the counter store was unavailable",
        )?;

        registry.register(Box::new(quota_decisions.clone()))?;
        registry.register(Box::new(store_fallbacks.clone()))?;

        Ok(Self {
            registry,
            quota_decisions,
            store_fallbacks,
        })
    }

    pub fn record_quota_decision(&self, kind: &str, quota: &DailyQuota) {
        let outcome = if quota.ok { "allowed" } else { "rejected" };
        self.quota_decisions
            .with_label_values(&[kind, quota.backend.as_str(), outcome])
            .inc();

        if quota.backend == CounterBackend::Local {
            self.store_fallbacks.inc();
        }
    }

    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
