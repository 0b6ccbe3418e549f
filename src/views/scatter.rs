use crate::core::cache::QueryParams;
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::{filter_query, lenient_f64};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPoint {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub details_link: Option<String>,
    #[serde(default)]
    pub accessible_to_foreigners: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub interior_surface: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub land_surface: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Accessible,
    NotAccessible,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterChart {
    pub accessible: Vec<ScatterPoint>,
    pub not_accessible: Vec<ScatterPoint>,
}

impl ScatterChart {
    pub fn series(&self, series: Series) -> &[ScatterPoint] {
        match series {
            Series::Accessible => &self.accessible,
            Series::NotAccessible => &self.not_accessible,
        }
    }

    /// Detail page behind a clicked point.
    pub fn link_at(&self, series: Series, index: usize) -> Option<&str> {
        self.series(series).get(index)?.link.as_deref()
    }

    pub fn len(&self) -> usize {
        self.accessible.len() + self.not_accessible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScatterKind {
    /// Price against interior (or land) surface.
    #[default]
    PriceVsSize,
    /// Same axes, restricted to a size window.
    PriceVsAccessible {
        min_size: Option<f64>,
        max_size: Option<f64>,
    },
}

/// Price scatter split by whether foreigners may buy.
#[derive(Debug, Clone, Default)]
pub struct ScatterView {
    pub kind: ScatterKind,
}

impl ScatterView {
    pub fn price_vs_size() -> Self {
        Self {
            kind: ScatterKind::PriceVsSize,
        }
    }

    pub fn price_vs_accessible(min_size: Option<f64>, max_size: Option<f64>) -> Self {
        Self {
            kind: ScatterKind::PriceVsAccessible { min_size, max_size },
        }
    }
}

impl ViewSpec for ScatterView {
    type Raw = Vec<PropertyPoint>;
    type Model = ScatterChart;

    fn namespace(&self) -> &'static str {
        match self.kind {
            ScatterKind::PriceVsSize => "scatterPlot",
            ScatterKind::PriceVsAccessible { .. } => "priceVsAccessible",
        }
    }

    fn endpoint(&self) -> String {
        match self.kind {
            ScatterKind::PriceVsSize => "scatter_plot_data/".to_string(),
            ScatterKind::PriceVsAccessible { .. } => "price_vs_accessible/".to_string(),
        }
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        let builder = filter_query(filter);
        match self.kind {
            ScatterKind::PriceVsSize => builder.build(),
            ScatterKind::PriceVsAccessible { min_size, max_size } => builder
                .param("min_size", min_size)
                .param("max_size", max_size)
                .build(),
        }
    }

    fn shape(&self, raw: &Vec<PropertyPoint>, ctx: &RenderContext<'_>) -> ScatterChart {
        let mut chart = ScatterChart::default();
        for row in raw {
            let (Some(x), Some(price)) = (row.interior_surface.or(row.land_surface), row.price)
            else {
                continue;
            };
            let point = ScatterPoint {
                x,
                y: currency::convert(price, ctx.currency, ctx.rates),
                label: format!("{} - {}", row.title, row.location),
                link: row.details_link.clone(),
            };
            if row.accessible_to_foreigners {
                chart.accessible.push(point);
            } else {
                chart.not_accessible.push(point);
            }
        }
        chart
    }
}
