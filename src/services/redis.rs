use std::sync::Arc;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, RedisResult, Script};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::services::counter_store::{CounterStore, IncrOutcome};

// INCR and the first EXPIRE run as one server-side step, so concurrent
// callers can neither lose increments nor leave a counter without expiry.
const INCR_WITH_TTL_SCRIPT: &str = r#"
    local count = redis.call('INCR', KEYS[1])
    if redis.call('TTL', KEYS[1]) < 0 then
        redis.call('EXPIRE', KEYS[1], ARGV[1])
    end
    return count
"#;

/// Redis-backed counter store with a lazily established, shared connection.
#[derive(Clone)]
pub struct RedisService {
    client: Client,
    connection_manager: Arc<OnceCell<ConnectionManager>>,
    incr_script: Arc<Script>,
}

impl RedisService {
    /// Parses the URL only; no connection is made until first use.
    pub fn new(redis_url: &str) -> RedisResult<Self> {
        let client = Client::open(redis_url)?;

        Ok(Self {
            client,
            connection_manager: Arc::new(OnceCell::new()),
            incr_script: Arc::new(Script::new(INCR_WITH_TTL_SCRIPT)),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn is_connected(&self) -> bool {
        self.connection_manager.initialized()
    }

    // Exactly one connection attempt; a refused connection reports at once.
    async fn connection_manager(&self) -> Option<ConnectionManager> {
        let result = self
            .connection_manager
            .get_or_try_init(|| async {
                debug!("opening redis connection manager");
                ConnectionManager::new_with_backoff(self.client.clone(), 2, 100, 0).await
            })
            .await;

        match result {
            Ok(manager) => Some(manager.clone()),
            Err(err) => {
                warn!(error = %err, "redis connection failed");
                None
            }
        }
    }

    fn established(&self) -> Option<ConnectionManager> {
        self.connection_manager.get().cloned()
    }
}

#[async_trait]
impl CounterStore for RedisService {
    async fn connect(&self) {
        let _ = self.connection_manager().await;
    }

    /// Uses the connection opened by [`CounterStore::connect`]; never opens one itself.
    async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> IncrOutcome {
        let Some(mut conn) = self.established() else {
            return IncrOutcome::Unavailable;
        };

        let result: RedisResult<i64> = self
            .incr_script
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await;

        counted_from_reply(key, result)
    }

    async fn health_check(&self) -> bool {
        let Some(mut conn) = self.connection_manager().await else {
            return false;
        };

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}

fn counted_from_reply(key: &str, reply: RedisResult<i64>) -> IncrOutcome {
    match reply {
        Ok(count) if count > 0 => IncrOutcome::Counted(count as u64),
        Ok(count) => {
            warn!(key, count, "redis returned a non-positive counter value");
            IncrOutcome::Unavailable
        }
        Err(err) => {
            warn!(key, error = %err, "redis increment failed");
            IncrOutcome::Unavailable
        }
    }
}
