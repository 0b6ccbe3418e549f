use crate::core::cache::{QueryBuilder, QueryParams};
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::lenient_f64;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics and market value are slow aggregate queries on the server.
pub const DASHBOARD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_per_sq_meter: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_interior_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_land_size: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsCard {
    pub price_per_sq_meter: String,
    pub average_interior_size: String,
    pub average_land_size: String,
    pub count: u64,
}

/// Rounds to whole square metres; absent or zero sizes read `0 m²`.
fn size(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => format!("{v:.0} m²"),
        _ => "0 m²".to_string(),
    }
}

pub struct MetricsView;

impl ViewSpec for MetricsView {
    type Raw = Metrics;
    type Model = MetricsCard;

    fn namespace(&self) -> &'static str {
        "metrics"
    }

    fn endpoint(&self) -> String {
        "metrics/".to_string()
    }

    /// `property_type` goes out even when it is "All"; the server reads it unconditionally.
    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("property_type", filter.property_type.as_str())
            .param("region", filter.region_param())
            .param("location", filter.location_param())
            .build()
    }

    fn shape(&self, raw: &Metrics, ctx: &RenderContext<'_>) -> MetricsCard {
        MetricsCard {
            price_per_sq_meter: currency::display(
                raw.price_per_sq_meter.unwrap_or(f64::NAN),
                ctx.currency,
                ctx.rates,
            ),
            average_interior_size: size(raw.average_interior_size),
            average_land_size: size(raw.average_land_size),
            count: raw.count.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketValue {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_market_value: Option<f64>,
}

/// Total asking price of every unsold listing. Not filtered.
pub struct MarketValueView;

impl ViewSpec for MarketValueView {
    type Raw = MarketValue;
    type Model = Option<String>;

    fn namespace(&self) -> &'static str {
        "currentMarketValue"
    }

    fn endpoint(&self) -> String {
        "current_market_value/".to_string()
    }

    fn query(&self, _filter: &FilterState) -> QueryParams {
        QueryParams::new()
    }

    fn shape(&self, raw: &MarketValue, ctx: &RenderContext<'_>) -> Option<String> {
        Some(currency::display(
            raw.current_market_value.unwrap_or(f64::NAN),
            ctx.currency,
            ctx.rates,
        ))
    }
}
