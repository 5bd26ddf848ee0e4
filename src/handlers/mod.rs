use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    services::{counter_store::CounterStore, metrics::MetricsService, quota::QuotaService},
};

pub mod assistant;
pub mod health;
pub mod metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub quota: Arc<QuotaService>,
    pub store: Arc<dyn CounterStore>,
    pub jwt: Arc<JwtService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CounterStore>,
        quota: QuotaService,
    ) -> anyhow::Result<Self> {
        let jwt = JwtService::new(&config.jwt_secret);

        Ok(Self {
            config: Arc::new(config),
            quota: Arc::new(quota),
            store,
            jwt: Arc::new(jwt),
            metrics: Arc::new(MetricsService::new()?),
        })
    }
}
