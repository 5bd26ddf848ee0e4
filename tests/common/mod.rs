use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{TimeZone, Utc};

use cherry_quota_server::{
    auth::JwtService,
    config::Config,
    create_app,
    handlers::AppState,
    models::Tier,
    services::{CounterStore, IncrOutcome, LocalCounters, ManualClock, QuotaService},
};

pub const SECRET: &str = "integration-secret";

/// Atomic in-memory counter store standing in for redis.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn count(&self, key: &str) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn connect(&self) {}

    async fn incr_with_ttl(&self, key: &str, _ttl_seconds: u64) -> IncrOutcome {
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        IncrOutcome::Counted(*count)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Store that is never reachable.
pub struct DownStore;

#[async_trait]
impl CounterStore for DownStore {
    async fn connect(&self) {}

    async fn incr_with_ttl(&self, _key: &str, _ttl_seconds: u64) -> IncrOutcome {
        IncrOutcome::Unavailable
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Store whose calls never finish in any reasonable time.
pub struct HangingStore;

#[async_trait]
impl CounterStore for HangingStore {
    async fn connect(&self) {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    }

    async fn incr_with_ttl(&self, _key: &str, _ttl_seconds: u64) -> IncrOutcome {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        IncrOutcome::Unavailable
    }

    async fn health_check(&self) -> bool {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        true
    }
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: SECRET.to_string(),
        ..Config::default()
    }
}

/// App frozen at 2024-05-01 12:00:00 UTC.
pub fn build_app(config: Config, store: Arc<dyn CounterStore>) -> Router {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ));
    let quota = QuotaService::new(Arc::clone(&store), Arc::new(LocalCounters::new()))
        .with_clock(clock);
    let state = AppState::new(config, store, quota).expect("failed to build app state");
    create_app(state)
}

pub fn token_for(user_id: &str, tier: Tier) -> String {
    JwtService::new(SECRET)
        .generate_access_token(user_id, tier)
        .expect("failed to sign token")
}

pub fn action_request(uri: &str, token: Option<&str>, prompt: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder
        .body(Body::from(serde_json::json!({ "prompt": prompt }).to_string()))
        .unwrap()
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
