//! Generic fetch → cache → shape adapter shared by every view.
//!
//! A view is described by a [`ViewSpec`]: a cache namespace, an endpoint, the
//! query derived from the current [`FilterState`], and a shaping function.
//! [`ViewAdapter`] drives the `Idle → Loading → Ready | Failed` cycle for one
//! view instance. Raw API payloads are cached; currency conversion happens in
//! [`ViewSpec::shape`] at render time, so a rate change never leaves a stale
//! converted figure in the cache.
//!
//! Every refresh takes a new generation number. A response is applied only if
//! its generation is still the latest, so a slow request for an old filter
//! cannot overwrite the state produced by a newer one.

use crate::core::api::{FailureKind, PropertyApi};
use crate::core::cache::{CacheKey, CachePolicy, FetchCache, QueryParams};
use crate::core::currency::RateTable;
use crate::core::filter::{Currency, FilterState};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

/// Display settings applied when shaping raw rows.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub currency: Currency,
    pub rates: &'a RateTable,
}

impl<'a> RenderContext<'a> {
    pub fn new(currency: Currency, rates: &'a RateTable) -> Self {
        Self { currency, rates }
    }
}

pub trait ViewSpec: Send + Sync + 'static {
    /// Payload as returned by the API; this is what gets cached.
    type Raw: DeserializeOwned + Clone + Send + Sync + 'static;
    /// Renderer-ready shape. `Default` is the empty state.
    type Model: Default;

    fn namespace(&self) -> &'static str;

    fn endpoint(&self) -> String;

    /// Filter subset and view parameters sent to the API.
    fn query(&self, filter: &FilterState) -> QueryParams;

    fn shape(&self, raw: &Self::Raw, ctx: &RenderContext<'_>) -> Self::Model;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<R> {
    Idle,
    Loading,
    Ready(R),
    Failed(FailureKind),
}

impl<R> ViewState<R> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }
}

/// What a call to [`ViewAdapter::refresh`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    CacheHit,
    Fetched,
    Failed(FailureKind),
    /// A newer refresh started before this one finished; the result was dropped.
    Stale,
}

pub struct ViewAdapter<S: ViewSpec> {
    spec: RwLock<S>,
    api: Arc<dyn PropertyApi>,
    cache: FetchCache<S::Raw>,
    timeout: Option<Duration>,
    latest: AtomicU64,
    state: Mutex<ViewState<S::Raw>>,
}

impl<S: ViewSpec> ViewAdapter<S> {
    pub fn new(spec: S, api: Arc<dyn PropertyApi>, policy: CachePolicy) -> Self {
        Self {
            spec: RwLock::new(spec),
            api,
            cache: FetchCache::with_policy(policy),
            timeout: None,
            latest: AtomicU64::new(0),
            state: Mutex::new(ViewState::Idle),
        }
    }

    /// Treats requests slower than `timeout` as failed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Changes view-specific parameters such as sort order or size bounds.
    /// Takes effect on the next refresh.
    pub fn configure(&self, change: impl FnOnce(&mut S)) {
        let mut spec = self.spec.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut spec);
    }

    pub fn cache(&self) -> &FetchCache<S::Raw> {
        &self.cache
    }

    pub async fn state(&self) -> ViewState<S::Raw> {
        self.state.lock().await.clone()
    }

    /// Brings the view in line with `filter`, from cache when possible.
    pub async fn refresh(&self, filter: &FilterState) -> FetchOutcome {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let (namespace, endpoint, query) = {
            let spec = self.spec.read().unwrap_or_else(PoisonError::into_inner);
            (spec.namespace(), spec.endpoint(), spec.query(filter))
        };
        let key = CacheKey::new(namespace, &query);

        {
            let mut state = self.state.lock().await;
            if self.is_current(generation) {
                *state = ViewState::Loading;
            }
        }

        if let Some(raw) = self.cache.get(&key).await {
            return self
                .apply(generation, ViewState::Ready(raw), FetchOutcome::CacheHit)
                .await;
        }

        match self.fetch(&endpoint, &query).await {
            Ok(raw) => {
                self.cache.put(key, raw.clone()).await;
                self.apply(generation, ViewState::Ready(raw), FetchOutcome::Fetched)
                    .await
            }
            Err(e) => {
                let kind = FailureKind::classify(&e);
                let error = format!("{e:#}");
                warn!(view = namespace, ?kind, %error, "Fetch failed");
                self.apply(generation, ViewState::Failed(kind), FetchOutcome::Failed(kind))
                    .await
            }
        }
    }

    /// Shapes the current data, or returns the empty model when not ready.
    pub async fn render(&self, ctx: &RenderContext<'_>) -> S::Model {
        let state = self.state.lock().await;
        match &*state {
            ViewState::Ready(raw) => {
                let spec = self.spec.read().unwrap_or_else(PoisonError::into_inner);
                spec.shape(raw, ctx)
            }
            _ => S::Model::default(),
        }
    }

    /// Refreshes on every filter change until the sender side is dropped.
    /// `on_refresh` sees each filter with the outcome of its refresh.
    pub async fn follow<F>(&self, mut filters: watch::Receiver<FilterState>, mut on_refresh: F)
    where
        F: FnMut(&FilterState, FetchOutcome),
    {
        loop {
            let filter = filters.borrow_and_update().clone();
            let outcome = self.refresh(&filter).await;
            on_refresh(&filter, outcome);
            if filters.changed().await.is_err() {
                debug!("Filter channel closed, stopping view");
                break;
            }
        }
    }

    async fn fetch(&self, endpoint: &str, query: &QueryParams) -> Result<S::Raw> {
        let call = self.api.get(endpoint, query);
        let value = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .with_context(|| format!("Request to {endpoint} timed out after {timeout:?}"))??,
            None => call.await?,
        };
        decode(endpoint, value)
    }

    async fn apply(
        &self,
        generation: u64,
        state: ViewState<S::Raw>,
        outcome: FetchOutcome,
    ) -> FetchOutcome {
        let mut current = self.state.lock().await;
        if !self.is_current(generation) {
            debug!(
                generation,
                latest = self.latest.load(Ordering::SeqCst),
                "Discarding stale response"
            );
            return FetchOutcome::Stale;
        }
        *current = state;
        outcome
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.latest.load(Ordering::SeqCst)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .with_context(|| format!("Unexpected response shape from {endpoint}"))
}

/// On-demand, per-row secondary fetches (expanded table rows, item history).
/// Entries live for the session and are not dropped when the parent refreshes.
pub struct RowDetails<V>
where
    V: Clone + Send + Sync + 'static,
{
    namespace: &'static str,
    api: Arc<dyn PropertyApi>,
    cache: FetchCache<V>,
}

impl<V> RowDetails<V>
where
    V: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(namespace: &'static str, api: Arc<dyn PropertyApi>, policy: CachePolicy) -> Self {
        Self {
            namespace,
            api,
            cache: FetchCache::with_policy(policy),
        }
    }

    /// Returns the cached row details or fetches them. Failures yield `None`.
    pub async fn fetch(&self, endpoint: &str, query: QueryParams) -> Option<V> {
        let mut key_params = query.clone();
        key_params.insert("path".to_string(), Value::from(endpoint));
        let key = CacheKey::new(self.namespace, &key_params);

        if let Some(details) = self.cache.get(&key).await {
            return Some(details);
        }

        let result = match self.api.get(endpoint, &query).await {
            Ok(value) => decode::<V>(endpoint, value),
            Err(e) => Err(e),
        };
        match result {
            Ok(details) => {
                self.cache.put(key, details.clone()).await;
                Some(details)
            }
            Err(e) => {
                let kind = FailureKind::classify(&e);
                let error = format!("{e:#}");
                warn!(view = self.namespace, ?kind, %error, "Detail fetch failed");
                None
            }
        }
    }

    pub fn cache(&self) -> &FetchCache<V> {
        &self.cache
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    /// In-memory API: responses per endpoint and optional per-filter delays.
    #[derive(Default)]
    pub struct MockApi {
        responses: std::sync::Mutex<HashMap<String, Value>>,
        delays: HashMap<String, Duration>,
        pub calls: AtomicUsize,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, endpoint: &str, body: Value) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(endpoint.to_string(), body);
            self
        }

        /// Delays requests whose `property_type` param equals `property_type`.
        pub fn delay(mut self, property_type: &str, delay: Duration) -> Self {
            self.delays.insert(property_type.to_string(), delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PropertyApi for MockApi {
        async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = query
                .get("property_type")
                .and_then(Value::as_str)
                .or(Some("All"))
                .and_then(|t| self.delays.get(t))
                .copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let body = self
                .responses
                .lock()
                .unwrap()
                .get(endpoint)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused: {endpoint}"))?;
            // Echo the query so tests can tell which request a state came from.
            Ok(match body {
                Value::Object(mut map) => {
                    map.insert("query".to_string(), serde_json::to_value(query)?);
                    Value::Object(map)
                }
                other => other,
            })
        }

        async fn post(&self, endpoint: &str, _body: &Value) -> Result<Value> {
            self.get(endpoint, &QueryParams::new()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MockApi;
    use super::*;
    use crate::core::cache::QueryBuilder;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct Counted {
        total: u64,
        query: QueryParams,
    }

    struct CountSpec;

    impl ViewSpec for CountSpec {
        type Raw = Counted;
        type Model = Option<(u64, String)>;

        fn namespace(&self) -> &'static str {
            "count"
        }

        fn endpoint(&self) -> String {
            "count/".to_string()
        }

        fn query(&self, filter: &FilterState) -> QueryParams {
            QueryBuilder::new()
                .param("property_type", filter.property_type_param())
                .param("region", filter.region_param())
                .build()
        }

        fn shape(&self, raw: &Counted, ctx: &RenderContext<'_>) -> Self::Model {
            let kind = raw
                .query
                .get("property_type")
                .and_then(Value::as_str)
                .unwrap_or("All")
                .to_string();
            Some((raw.total, format!("{kind} in {}", ctx.currency)))
        }
    }

    fn adapter(api: Arc<MockApi>) -> ViewAdapter<CountSpec> {
        ViewAdapter::new(CountSpec, api, CachePolicy::default())
    }

    #[tokio::test]
    async fn test_refresh_then_render() {
        let api = Arc::new(MockApi::new().respond("count/", json!({"total": 12})));
        let view = adapter(api.clone());
        let rates = RateTable::default();
        let ctx = RenderContext::new(Currency::Euro, &rates);

        assert_eq!(view.state().await, ViewState::Idle);
        assert_eq!(view.render(&ctx).await, None);

        let outcome = view.refresh(&FilterState::default()).await;
        assert_eq!(outcome, FetchOutcome::Fetched);
        assert!(view.state().await.is_ready());
        assert_eq!(view.render(&ctx).await, Some((12, "All in €".to_string())));
    }

    #[tokio::test]
    async fn test_warm_cache_makes_no_network_calls() {
        let api = Arc::new(MockApi::new().respond("count/", json!({"total": 3})));
        let view = adapter(api.clone());
        let filter = FilterState::default().with_property_type("House");

        assert_eq!(view.refresh(&filter).await, FetchOutcome::Fetched);
        assert_eq!(api.call_count(), 1);

        assert_eq!(view.refresh(&filter).await, FetchOutcome::CacheHit);
        // Currency is applied at render time and is not part of the request.
        let other_currency = filter.with_currency(Currency::Dollar);
        assert_eq!(view.refresh(&other_currency).await, FetchOutcome::CacheHit);
        assert_eq!(api.call_count(), 1);

        let other_type = filter.with_property_type("Land");
        assert_eq!(view.refresh(&other_type).await, FetchOutcome::Fetched);
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_renders_empty_model() {
        let api = Arc::new(MockApi::new());
        let view = adapter(api.clone());
        let rates = RateTable::default();

        let outcome = view.refresh(&FilterState::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed(FailureKind::Network));
        assert_eq!(view.state().await, ViewState::Failed(FailureKind::Network));
        assert_eq!(
            view.render(&RenderContext::new(Currency::Rupee, &rates)).await,
            None
        );
        assert!(view.cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let api = Arc::new(MockApi::new().respond("count/", json!({"unexpected": true})));
        let view = adapter(api);

        let outcome = view.refresh(&FilterState::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed(FailureKind::Malformed));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(
            MockApi::new()
                .respond("count/", json!({"total": 1}))
                .delay("All", Duration::from_millis(100)),
        );
        let view = adapter(api.clone());
        let all = FilterState::default();
        let apartment = all.with_property_type("Apartment");

        let (first, second) = tokio::join!(view.refresh(&all), view.refresh(&apartment));

        assert_eq!(first, FetchOutcome::Stale);
        assert_eq!(second, FetchOutcome::Fetched);
        let rates = RateTable::default();
        let model = view
            .render(&RenderContext::new(Currency::Rupee, &rates))
            .await;
        assert_eq!(model, Some((1, "Apartment in Rs".to_string())));
        // The slow response is still cached under its own key.
        assert_eq!(view.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_timeout_marks_view_failed() {
        let api = Arc::new(
            MockApi::new()
                .respond("count/", json!({"total": 1}))
                .delay("All", Duration::from_millis(200)),
        );
        let view = adapter(api).with_timeout(Duration::from_millis(20));

        let outcome = view.refresh(&FilterState::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed(FailureKind::Timeout));
    }

    #[tokio::test]
    async fn test_follow_refreshes_on_filter_changes() {
        let api = Arc::new(MockApi::new().respond("count/", json!({"total": 5})));
        let view = Arc::new(adapter(api.clone()));
        let (tx, rx) = watch::channel(FilterState::default());

        let task = {
            let view = Arc::clone(&view);
            tokio::spawn(async move { view.follow(rx, |_, _| {}).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send_modify(|f| *f = f.with_property_type("Villa"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(tx);
        task.await.unwrap();

        assert_eq!(api.call_count(), 2);
        let rates = RateTable::default();
        let model = view
            .render(&RenderContext::new(Currency::Rupee, &rates))
            .await;
        assert_eq!(model, Some((5, "Villa in Rs".to_string())));
    }

    #[tokio::test]
    async fn test_row_details_cached_per_row() {
        let api = Arc::new(MockApi::new().respond("details/", json!({"total": 9})));
        let details = RowDetails::<Counted>::new("details", api.clone(), CachePolicy::default());

        let row = |id: u64| QueryBuilder::new().param("agencyId", id).build();
        assert!(details.fetch("details/", row(1)).await.is_some());
        assert!(details.fetch("details/", row(1)).await.is_some());
        assert!(details.fetch("details/", row(2)).await.is_some());
        assert_eq!(api.call_count(), 2);

        assert!(details.fetch("missing/", row(1)).await.is_none());
    }
}
