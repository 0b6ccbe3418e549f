use crate::core::currency::{RateTable, RateTableProvider};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Fetches the rate table once per session and serves it read-only afterwards.
///
/// A failed fetch is not remembered; the fallback table is returned for that
/// call and the next caller tries again.
pub struct SessionRateProvider<T: RateTableProvider> {
    inner: T,
    fallback: RateTable,
    rates: OnceCell<Arc<RateTable>>,
}

impl<T: RateTableProvider> SessionRateProvider<T> {
    pub fn new(inner: T, fallback: RateTable) -> Self {
        Self {
            inner,
            fallback,
            rates: OnceCell::new(),
        }
    }

    /// The session table, or the fallback if it cannot be fetched.
    pub async fn rates(&self) -> Arc<RateTable> {
        match self.fetch_rates_shared().await {
            Ok(rates) => rates,
            Err(e) => {
                warn!(error = %e, "Exchange rates unavailable, using fallback table");
                Arc::new(self.fallback.clone())
            }
        }
    }

    async fn fetch_rates_shared(&self) -> Result<Arc<RateTable>> {
        if self.rates.initialized() {
            debug!("Cache hit for exchange rates");
        }
        self.rates
            .get_or_try_init(|| async {
                debug!("Cache miss for exchange rates");
                self.inner.fetch_rates().await.map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl<T: RateTableProvider> RateTableProvider for SessionRateProvider<T> {
    async fn fetch_rates(&self) -> Result<RateTable> {
        Ok(self.fetch_rates_shared().await?.as_ref().clone())
    }
}
