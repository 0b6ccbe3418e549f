use crate::core::cache::QueryParams;
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::filter_query;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceDistribution {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Price histogram. Bins are labelled by their upper edge; the first one
/// reads `0 – <edge>`.
pub struct PriceDistributionView;

impl ViewSpec for PriceDistributionView {
    type Raw = PriceDistribution;
    type Model = Histogram;

    fn namespace(&self) -> &'static str {
        "priceDistribution"
    }

    fn endpoint(&self) -> String {
        "price_distribution/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        filter_query(filter).build()
    }

    fn shape(&self, raw: &PriceDistribution, ctx: &RenderContext<'_>) -> Histogram {
        let label_for = |edge: f64| currency::display(edge, ctx.currency, ctx.rates);

        let bins = raw
            .counts
            .iter()
            .zip(raw.bin_edges.iter().skip(1))
            .enumerate()
            .map(|(i, (&count, &upper))| {
                let label = if i == 0 {
                    format!("0 – {}", label_for(upper))
                } else {
                    label_for(upper)
                };
                HistogramBin { label, count }
            })
            .collect();

        Histogram { bins }
    }
}
