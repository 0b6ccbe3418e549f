//! Price-change feed with per-property price history.

use crate::core::api::PropertyApi;
use crate::core::cache::{CachePolicy, QueryBuilder, QueryParams};
use crate::core::currency::{self, Fallback};
use crate::core::filter::FilterState;
use crate::core::view::{FetchOutcome, RenderContext, RowDetails, ViewAdapter, ViewSpec};
use crate::views::{format_date, lenient_f64};
use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceChangeSort {
    #[default]
    PriceChange,
    InteriorSize,
}

impl PriceChangeSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceChangeSort::PriceChange => "price_change",
            PriceChangeSort::InteriorSize => "interior_size",
        }
    }
}

impl FromStr for PriceChangeSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_change" => Ok(PriceChangeSort::PriceChange),
            "interior_size" => Ok(PriceChangeSort::InteriorSize),
            other => bail!("Unknown sort order: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub property_id: i64,
    #[serde(default)]
    pub property_title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_change_percentage: Option<f64>,
    #[serde(default)]
    pub price_up: Option<bool>,
    #[serde(default)]
    pub details_link: Option<String>,
    #[serde(default)]
    pub price_change_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeFeed {
    #[serde(default)]
    pub price_changes: Vec<PriceChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceChangeItem {
    pub property_id: i64,
    pub title: String,
    pub previous_price: String,
    pub current_price: String,
    pub change: String,
    pub percentage: String,
    pub date: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceChangeLists {
    pub increasing: Vec<PriceChangeItem>,
    pub decreasing: Vec<PriceChangeItem>,
}

impl PriceChangeLists {
    pub fn len(&self) -> usize {
        self.increasing.len() + self.decreasing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prices in this feed stay in MUR when no rate is known for the target
/// currency.
fn money(amount: Option<f64>, ctx: &RenderContext<'_>) -> String {
    let amount = amount.unwrap_or(f64::NAN);
    currency::format(
        currency::convert_with(amount, ctx.currency, ctx.rates, Fallback::Unchanged),
        ctx.currency,
    )
}

pub struct PriceChangesView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sort: PriceChangeSort,
}

impl Default for PriceChangesView {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
            sort: PriceChangeSort::default(),
        }
    }
}

impl ViewSpec for PriceChangesView {
    type Raw = PriceChangeFeed;
    type Model = PriceChangeLists;

    fn namespace(&self) -> &'static str {
        "priceChanges"
    }

    fn endpoint(&self) -> String {
        "price-changes/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("start_date", self.start_date.format("%Y-%m-%d").to_string())
            .param("end_date", self.end_date.format("%Y-%m-%d").to_string())
            .param("property_type", filter.property_type.as_str())
            .param("region", filter.region.as_str())
            .param("sort_by", self.sort.as_str())
            .build()
    }

    fn shape(&self, raw: &PriceChangeFeed, ctx: &RenderContext<'_>) -> PriceChangeLists {
        let mut lists = PriceChangeLists::default();
        for change in &raw.price_changes {
            let item = PriceChangeItem {
                property_id: change.property_id,
                title: change.property_title.clone(),
                previous_price: money(change.previous_price, ctx),
                current_price: money(change.current_price, ctx),
                change: money(change.price_change, ctx),
                percentage: change
                    .price_change_percentage
                    .map(|p| format!("{p:.2}%"))
                    .unwrap_or_else(|| "N/A".to_string()),
                date: change
                    .price_change_date
                    .as_deref()
                    .map(format_date)
                    .unwrap_or_default(),
                link: change.details_link.clone(),
            };
            // Entries without a previous price carry no direction.
            if change.price_up == Some(true) {
                lists.increasing.push(item);
            } else {
                lists.decreasing.push(item);
            }
        }
        lists
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub date: String,
    pub price: String,
}

/// The feed plus the on-demand history of its items.
pub struct PriceChangeFeedView {
    pub feed: ViewAdapter<PriceChangesView>,
    history: RowDetails<Vec<PricePoint>>,
}

impl PriceChangeFeedView {
    pub fn new(api: Arc<dyn PropertyApi>, policy: CachePolicy) -> Self {
        Self {
            feed: ViewAdapter::new(PriceChangesView::default(), Arc::clone(&api), policy),
            history: RowDetails::new("priceHistory", api, policy),
        }
    }

    pub async fn refresh(&self, filter: &FilterState) -> FetchOutcome {
        self.feed.refresh(filter).await
    }

    pub async fn render(&self, ctx: &RenderContext<'_>) -> PriceChangeLists {
        self.feed.render(ctx).await
    }

    /// Price history of one property, oldest first. Fetched once per id.
    pub async fn history(&self, property_id: i64, ctx: &RenderContext<'_>) -> Vec<HistoryEntry> {
        let endpoint = format!("price-history/{property_id}/");
        let Some(points) = self.history.fetch(&endpoint, QueryParams::new()).await else {
            return Vec::new();
        };
        points
            .iter()
            .map(|point| HistoryEntry {
                date: format_date(&point.date),
                price: money(point.price, ctx),
            })
            .collect()
    }
}
