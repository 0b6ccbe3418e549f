//! Agency ranking table with expandable per-agency details.

use crate::core::api::PropertyApi;
use crate::core::cache::{CachePolicy, QueryBuilder, QueryParams};
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{FetchOutcome, RenderContext, RowDetails, ViewAdapter, ViewSpec};
use crate::views::lenient_f64;
use crate::views::pie::{PieChart, TypeCount, pie_from_counts};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DETAIL_PALETTE: [&str; 7] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#F7464A", "#949FB1", "#AC64AD",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyRow {
    pub agency_id: i64,
    pub agency_name: String,
    #[serde(default)]
    pub property_count: u64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub key: i64,
    pub agency: String,
    pub property_count: u64,
    pub total_value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingTable {
    pub rows: Vec<RankingRow>,
}

fn ranking_query(filter: &FilterState) -> QueryBuilder {
    QueryBuilder::new()
        .param("property_type", filter.property_type_param())
        .param("region", filter.region_param())
}

pub struct AgencyRankingView;

impl ViewSpec for AgencyRankingView {
    type Raw = Vec<AgencyRow>;
    type Model = RankingTable;

    fn namespace(&self) -> &'static str {
        "agencyRanking"
    }

    fn endpoint(&self) -> String {
        "agency-ranking/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        ranking_query(filter).build()
    }

    fn shape(&self, raw: &Vec<AgencyRow>, ctx: &RenderContext<'_>) -> RankingTable {
        let rows = raw
            .iter()
            .map(|agency| RankingRow {
                key: agency.agency_id,
                agency: agency.agency_name.clone(),
                property_count: agency.property_count,
                total_value: currency::display(
                    agency.total_value.unwrap_or(f64::NAN),
                    ctx.currency,
                    ctx.rates,
                ),
            })
            .collect();
        RankingTable { rows }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAverage {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_price_per_sq_meter: Option<f64>,
}

/// Market-wide average price per m² for the selected type and region.
pub struct MarketAverageView;

impl ViewSpec for MarketAverageView {
    type Raw = MarketAverage;
    /// Still in MUR; converted alongside the agency figure.
    type Model = Option<f64>;

    fn namespace(&self) -> &'static str {
        "averagePricePerSqMeter"
    }

    fn endpoint(&self) -> String {
        "average-price-per-sq-meter/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        ranking_query(filter).build()
    }

    fn shape(&self, raw: &MarketAverage, _ctx: &RenderContext<'_>) -> Option<f64> {
        raw.average_price_per_sq_meter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgencyDetails {
    #[serde(default)]
    pub property_type_distribution: Vec<TypeCount>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_price_per_sq_meter: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AgencyDetailView {
    /// Single property type selected: agency vs market price per m².
    Comparison {
        agency_price: String,
        market_price: String,
        above_market: bool,
    },
    /// All property types: the agency's type breakdown.
    Distribution(PieChart),
    #[default]
    Empty,
}

pub fn shape_details(
    details: &AgencyDetails,
    filter: &FilterState,
    market_average: Option<f64>,
    ctx: &RenderContext<'_>,
) -> AgencyDetailView {
    if !filter.is_all_property_types() {
        let agency = details.average_price_per_sq_meter.unwrap_or(0.0);
        let market = market_average.unwrap_or(0.0);
        return AgencyDetailView::Comparison {
            agency_price: currency::display(agency, ctx.currency, ctx.rates),
            market_price: currency::display(market, ctx.currency, ctx.rates),
            above_market: agency > market,
        };
    }

    if details.property_type_distribution.is_empty() {
        return AgencyDetailView::Empty;
    }
    AgencyDetailView::Distribution(pie_from_counts(
        &details.property_type_distribution,
        &DETAIL_PALETTE,
    ))
}

/// The ranking table, the market average it is compared against, and the
/// lazily fetched per-agency details.
pub struct AgencyRanking {
    pub table: ViewAdapter<AgencyRankingView>,
    pub market: ViewAdapter<MarketAverageView>,
    details: RowDetails<AgencyDetails>,
}

impl AgencyRanking {
    pub fn new(api: Arc<dyn PropertyApi>, policy: CachePolicy) -> Self {
        Self {
            table: ViewAdapter::new(AgencyRankingView, Arc::clone(&api), policy),
            market: ViewAdapter::new(MarketAverageView, Arc::clone(&api), policy),
            details: RowDetails::new("agencyDetails", api, policy),
        }
    }

    pub async fn refresh(&self, filter: &FilterState) -> FetchOutcome {
        if filter.is_all_property_types() {
            return self.table.refresh(filter).await;
        }
        let (table, _) = tokio::join!(self.table.refresh(filter), self.market.refresh(filter));
        table
    }

    pub async fn render(&self, ctx: &RenderContext<'_>) -> RankingTable {
        self.table.render(ctx).await
    }

    /// Fetches (once per agency and filter) and shapes an expanded row.
    pub async fn expand(
        &self,
        agency_id: i64,
        filter: &FilterState,
        ctx: &RenderContext<'_>,
    ) -> AgencyDetailView {
        let query = ranking_query(filter).param("agencyId", agency_id).build();
        let Some(details) = self.details.fetch("agency-details/", query).await else {
            return AgencyDetailView::Empty;
        };
        let market_average = if filter.is_all_property_types() {
            None
        } else {
            self.market.render(ctx).await
        };
        shape_details(&details, filter, market_average, ctx)
    }
}
