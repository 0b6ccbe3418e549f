use crate::core::cache::QueryParams;
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::{filter_query, format_date, parse_float};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingAverage {
    pub truncated_date: String,
    #[serde(default)]
    pub avg_price: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineChart {
    pub labels: Vec<String>,
    pub points: Vec<f64>,
}

impl LineChart {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Relative change between the first and last point, in percent.
    pub fn change(&self) -> Option<f64> {
        let first = *self.points.first()?;
        let last = *self.points.last()?;
        (first != 0.0).then(|| (last - first) / first * 100.0)
    }
}

/// Rolling average asking price over time.
pub struct MarketEvolutionView;

impl ViewSpec for MarketEvolutionView {
    type Raw = Vec<RollingAverage>;
    type Model = LineChart;

    fn namespace(&self) -> &'static str {
        "rollingAveragePrices"
    }

    fn endpoint(&self) -> String {
        "rolling-average-prices/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        filter_query(filter).build()
    }

    fn shape(&self, raw: &Vec<RollingAverage>, ctx: &RenderContext<'_>) -> LineChart {
        let mut chart = LineChart::default();
        for row in raw {
            let price = parse_float(&row.avg_price).unwrap_or(0.0);
            chart.labels.push(format_date(&row.truncated_date));
            chart.points.push(currency::convert(price, ctx.currency, ctx.rates));
        }
        chart
    }
}
