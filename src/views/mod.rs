//! One [`ViewSpec`](crate::core::ViewSpec) per visualization.

pub mod evolution;
pub mod heatmap;
pub mod histogram;
pub mod listings;
pub mod metrics;
pub mod pie;
pub mod price_changes;
pub mod ranking;
pub mod scatter;
pub mod valuation;

use crate::core::cache::QueryBuilder;
use crate::core::filter::FilterState;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The usual filter subset: "All" and empty values are left out.
pub(crate) fn filter_query(filter: &FilterState) -> QueryBuilder {
    QueryBuilder::new()
        .param("property_type", filter.property_type_param())
        .param("region", filter.region_param())
        .param("location", filter.location_param())
}

/// Accepts numbers, numeric strings and nulls, the way the API mixes them.
pub(crate) fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_float))
}

/// Surface areas render as whole square metres.
pub fn format_area(area: Option<f64>) -> String {
    match area {
        Some(a) if a.is_finite() => format!("{a:.0} m²"),
        _ => "N/A".to_string(),
    }
}

/// Reduces API dates and timestamps to a calendar date.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// `YYYY-MM-DD`, or the raw text when it is not a recognizable date.
pub fn format_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::Region;
    use serde_json::json;

    #[test]
    fn test_filter_query_drops_all_values() {
        let params = filter_query(&FilterState::default()).build();
        assert!(params.is_empty());

        let filter = FilterState::default()
            .with_property_type("Apartment")
            .with_region(Region::North)
            .with_location("Grand Baie");
        let params = filter_query(&filter).build();
        assert_eq!(params["property_type"], json!("Apartment"));
        assert_eq!(params["region"], json!("North"));
        assert_eq!(params["location"], json!("Grand Baie"));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(&json!(1.5)), Some(1.5));
        assert_eq!(parse_float(&json!("-20.25")), Some(-20.25));
        assert_eq!(parse_float(&json!("abc")), None);
        assert_eq!(parse_float(&json!(null)), None);
        assert_eq!(parse_float(&json!("NaN")), None);
    }

    #[test]
    fn test_dates() {
        assert_eq!(format_date("2024-06-01"), "2024-06-01");
        assert_eq!(format_date("2024-06-01T10:15:00Z"), "2024-06-01");
        assert_eq!(format_date("2024-06-01T10:15:00.123"), "2024-06-01");
        assert_eq!(format_date("last week"), "last week");
        assert_eq!(format_area(Some(120.4)), "120 m²");
        assert_eq!(format_area(None), "N/A");
    }
}
