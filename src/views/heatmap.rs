use crate::core::cache::{QueryBuilder, QueryParams};
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::parse_float;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A location row as served; coordinates and prices may be numbers, numeric
/// strings or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub latitude: Value,
    #[serde(default)]
    pub longitude: Value,
    #[serde(default)]
    pub average_price: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Average price in MUR.
    pub weight: f64,
    pub average_price: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatMap {
    pub points: Vec<HeatPoint>,
    /// Every location name, including those without usable coordinates.
    pub locations: Vec<String>,
}

impl HeatMap {
    pub fn max_weight(&self) -> Option<f64> {
        self.points.iter().map(|p| p.weight).reduce(f64::max)
    }
}

pub struct LocationsView;

impl ViewSpec for LocationsView {
    type Raw = Vec<LocationRow>;
    type Model = HeatMap;

    fn namespace(&self) -> &'static str {
        "locations"
    }

    fn endpoint(&self) -> String {
        "locations/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("region", filter.region_param())
            .build()
    }

    fn shape(&self, raw: &Vec<LocationRow>, ctx: &RenderContext<'_>) -> HeatMap {
        let points = raw
            .iter()
            .filter_map(|row| {
                let lat = parse_float(&row.latitude)?;
                let lng = parse_float(&row.longitude)?;
                let weight = parse_float(&row.average_price)?;
                Some(HeatPoint {
                    name: row.name.clone(),
                    lat,
                    lng,
                    weight,
                    average_price: currency::display(weight, ctx.currency, ctx.rates),
                })
            })
            .collect();

        let mut locations: Vec<String> = raw
            .iter()
            .map(|row| row.name.clone())
            .filter(|name| !name.is_empty())
            .collect();
        locations.sort();
        locations.dedup();

        HeatMap { points, locations }
    }
}
