use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::core::api::PropertyApi;
use crate::core::cache::QueryParams;
use crate::core::currency::{RateTable, RateTableProvider};

pub const EXCHANGE_RATES_ENDPOINT: &str = "exchange_rates/";

/// Reads the exchange rate table from the property API.
pub struct ApiRateProvider {
    api: Arc<dyn PropertyApi>,
}

impl ApiRateProvider {
    pub fn new(api: Arc<dyn PropertyApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RateTableProvider for ApiRateProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        let value = self
            .api
            .get(EXCHANGE_RATES_ENDPOINT, &QueryParams::new())
            .await?;
        let rates: RateTable = serde_json::from_value(value)
            .context("Failed to parse exchange rate table")?;
        debug!(count = rates.len(), "Fetched exchange rates");
        Ok(rates)
    }
}
