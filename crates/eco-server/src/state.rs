//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::{CacheTtls, EcoRouter};
use crate::providers::{AirQualityLookup, AirQualityProvider, OpenMeteoClient, OsrmClient, RoadProvider};

pub struct AppState {
    config: Config,
    router: EcoRouter,
    road: Arc<dyn RoadProvider>,
    air: Arc<dyn AirQualityProvider>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the router, caches and lookups around the given providers.
    pub fn new(
        config: Config,
        road: Arc<dyn RoadProvider>,
        air: Arc<dyn AirQualityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lookup = AirQualityLookup::new(
            air.clone(),
            TtlCache::new(clock.clone()),
            Duration::from_secs(config.aqi_cache_ttl_s),
        );
        let router = EcoRouter::new(
            road.clone(),
            Arc::new(lookup),
            TtlCache::new(clock.clone()),
            clock.clone(),
            CacheTtls::from_config(&config),
        );
        Self {
            config,
            router,
            road,
            air,
            clock,
        }
    }

    /// Production state: HTTP provider clients and the system clock.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eco-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        let road = Arc::new(OsrmClient::new(client.clone(), &config));
        let air = Arc::new(OpenMeteoClient::new(client, &config));
        Ok(Self::new(config, road, air, Arc::new(SystemClock)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &EcoRouter {
        &self.router
    }

    pub fn road(&self) -> &dyn RoadProvider {
        self.road.as_ref()
    }

    pub fn air(&self) -> &dyn AirQualityProvider {
        self.air.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
