use crate::core::cache::{QueryBuilder, QueryParams};
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use serde::{Deserialize, Serialize};

/// Slice fills, reused from the start once categories outnumber them.
pub const PALETTE: [&str; 15] = [
    "rgba(75, 192, 192, 0.2)",
    "rgba(255, 99, 132, 0.2)",
    "rgba(255, 205, 86, 0.2)",
    "rgba(54, 162, 235, 0.2)",
    "rgba(153, 102, 255, 0.2)",
    "rgba(201, 203, 207, 0.2)",
    "rgba(255, 159, 64, 0.2)",
    "rgba(199, 199, 199, 0.2)",
    "rgba(83, 102, 255, 0.2)",
    "rgba(255, 99, 132, 0.2)",
    "rgba(54, 162, 235, 0.2)",
    "rgba(255, 206, 86, 0.2)",
    "rgba(75, 192, 192, 0.2)",
    "rgba(153, 102, 255, 0.2)",
    "rgba(255, 159, 64, 0.2)",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: u64,
    pub color: String,
    pub border_color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieChart {
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    pub fn total(&self) -> u64 {
        self.slices.iter().map(|s| s.count).sum()
    }

    /// Share of `index` in percent, 0 for an empty chart.
    pub fn share(&self, index: usize) -> f64 {
        let total = self.total();
        match self.slices.get(index) {
            Some(slice) if total > 0 => slice.count as f64 * 100.0 / total as f64,
            _ => 0.0,
        }
    }
}

/// Builds slices from counts, cycling through `palette`.
pub fn pie_from_counts(counts: &[TypeCount], palette: &[&str]) -> PieChart {
    let slices = counts
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let color = palette
                .get(i % palette.len().max(1))
                .copied()
                .unwrap_or_default();
            PieSlice {
                label: item.kind.clone(),
                count: item.count,
                color: color.to_string(),
                border_color: color.replace("0.2", "1"),
            }
        })
        .collect();
    PieChart { slices }
}

/// Property type breakdown for the selected region.
pub struct PropertyTypeView;

impl ViewSpec for PropertyTypeView {
    type Raw = Vec<TypeCount>;
    type Model = PieChart;

    fn namespace(&self) -> &'static str {
        "propertyTypeDistribution"
    }

    fn endpoint(&self) -> String {
        "property_type_distribution/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("region", filter.region.as_str())
            .build()
    }

    fn shape(&self, raw: &Vec<TypeCount>, _ctx: &RenderContext<'_>) -> PieChart {
        pie_from_counts(raw, &PALETTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateTable;
    use crate::core::filter::{Currency, Region};
    use serde_json::json;

    fn counts(n: usize) -> Vec<TypeCount> {
        (0..n)
            .map(|i| TypeCount {
                kind: format!("Type {i}"),
                count: i as u64 + 1,
            })
            .collect()
    }

    #[test]
    fn test_palette_wraps() {
        let rates = RateTable::default();
        let pie = PropertyTypeView.shape(&counts(17), &RenderContext::new(Currency::Rupee, &rates));

        assert_eq!(pie.slices.len(), 17);
        assert_eq!(pie.slices[15].color, PALETTE[0]);
        assert_eq!(pie.slices[16].color, PALETTE[1]);
        assert_eq!(pie.slices[0].border_color, "rgba(75, 192, 192, 1)");
    }

    #[test]
    fn test_shares() {
        let pie = pie_from_counts(&counts(3), &PALETTE);
        assert_eq!(pie.total(), 6);
        assert_eq!(pie.share(2), 50.0);
        assert_eq!(pie.share(9), 0.0);
        assert_eq!(PieChart::default().share(0), 0.0);
    }

    #[test]
    fn test_region_always_sent() {
        let query = PropertyTypeView.query(&FilterState::default());
        assert_eq!(query["region"], json!("All"));
        let query = PropertyTypeView.query(&FilterState::default().with_region(Region::South));
        assert_eq!(query["region"], json!("South"));

        let raw: Vec<TypeCount> =
            serde_json::from_value(json!([{"type": "Apartment", "count": 4}])).unwrap();
        assert_eq!(raw[0].kind, "Apartment");
    }
}
