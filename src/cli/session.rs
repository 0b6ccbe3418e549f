//! Per-invocation wiring: API client, session rate table and filters.

use crate::core::api::PropertyApi;
use crate::core::config::AppConfig;
use crate::core::currency::RateTable;
use crate::core::filter::{Currency, FilterState, FilterStore, Region};
use crate::core::view::{FetchOutcome, RenderContext, ViewAdapter, ViewSpec};
use crate::providers::{ApiRateProvider, HttpPropertyApi, SessionRateProvider};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Filter values given on the command line, applied over the configured
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct FilterOverrides {
    pub currency: Option<Currency>,
    pub property_type: Option<String>,
    pub region: Option<Region>,
    pub location: Option<String>,
}

impl FilterOverrides {
    /// Region goes first since selecting one clears the location.
    pub fn apply(&self, store: &FilterStore) {
        if let Some(currency) = self.currency {
            store.set_currency(currency);
        }
        if let Some(property_type) = &self.property_type {
            store.set_property_type(property_type);
        }
        if let Some(region) = self.region {
            store.set_region(region);
        }
        if let Some(location) = &self.location {
            store.set_location(location);
        }
    }
}

pub struct Session {
    pub config: AppConfig,
    pub api: Arc<dyn PropertyApi>,
    pub rates: Arc<RateTable>,
    pub filters: FilterStore,
}

impl Session {
    pub async fn connect(config: AppConfig, overrides: &FilterOverrides) -> Result<Self> {
        let api: Arc<dyn PropertyApi> = Arc::new(HttpPropertyApi::from_config(&config.api)?);
        Ok(Self::with_api(config, overrides, api).await)
    }

    pub async fn with_api(
        config: AppConfig,
        overrides: &FilterOverrides,
        api: Arc<dyn PropertyApi>,
    ) -> Self {
        let filters = FilterStore::new(config.defaults.filter());
        overrides.apply(&filters);
        debug!(filter = ?filters.current(), "Resolved filters");

        let provider = SessionRateProvider::new(
            ApiRateProvider::new(Arc::clone(&api)),
            config.fallback_rates.clone(),
        );
        let rates = provider.rates().await;
        info!(currencies = rates.len(), "Session ready");

        Session {
            config,
            api,
            rates,
            filters,
        }
    }

    pub fn filter(&self) -> FilterState {
        self.filters.current()
    }

    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext::new(self.filter().currency, &self.rates)
    }

    /// Builds an adapter for `spec` with the configured cache policy and
    /// request timeout.
    pub fn adapter<S: ViewSpec>(&self, spec: S) -> ViewAdapter<S> {
        let adapter = ViewAdapter::new(spec, Arc::clone(&self.api), self.config.cache.policy());
        match self.config.request_timeout() {
            Some(timeout) => adapter.with_timeout(timeout),
            None => adapter,
        }
    }

    /// Fetches and shapes one view for the current filters.
    pub async fn load<S: ViewSpec>(&self, spec: S) -> (FetchOutcome, S::Model) {
        self.load_adapter(self.adapter(spec)).await
    }

    pub async fn load_with_timeout<S: ViewSpec>(
        &self,
        spec: S,
        timeout: Duration,
    ) -> (FetchOutcome, S::Model) {
        self.load_adapter(self.adapter(spec).with_timeout(timeout))
            .await
    }

    async fn load_adapter<S: ViewSpec>(&self, adapter: ViewAdapter<S>) -> (FetchOutcome, S::Model) {
        let outcome = adapter.refresh(&self.filter()).await;
        let model = adapter.render(&self.render_context()).await;
        (outcome, model)
    }
}
