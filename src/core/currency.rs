//! Currency conversion and display formatting

use crate::core::filter::Currency;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multipliers from MUR to each currency code, e.g. `{"EUR": 0.021}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(HashMap<String, f64>);

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        RateTable(rates)
    }

    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.0.get(currency.code()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        RateTable(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[async_trait]
pub trait RateTableProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// What to return when the rate table has no entry for the currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Nan,
    Unchanged,
}

/// Converts a MUR amount into `currency`. Yields `NaN` if the rate is missing.
pub fn convert(amount: f64, currency: Currency, rates: &RateTable) -> f64 {
    convert_with(amount, currency, rates, Fallback::Nan)
}

pub fn convert_with(amount: f64, currency: Currency, rates: &RateTable, fallback: Fallback) -> f64 {
    match (rates.rate(currency), fallback) {
        (Some(rate), _) => amount * rate,
        (None, Fallback::Nan) => f64::NAN,
        (None, Fallback::Unchanged) => amount,
    }
}

/// Formats an amount the way an en-US locale renders currencies, whatever the
/// currency: `€21,000.00`, `$24,000.00`, `MUR 1,000,000.00`.
pub fn format(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() {
        return "N/A".to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let digits = group_thousands(whole);

    let prefix = match currency {
        Currency::Euro => "€".to_string(),
        Currency::Dollar => "$".to_string(),
        Currency::Rupee => format!("{}\u{a0}", currency.code()),
    };
    let sign = if amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };

    format!("{sign}{prefix}{digits}.{fraction}")
}

/// Converts then formats, the common case for rendering API prices.
pub fn display(amount: f64, currency: Currency, rates: &RateTable) -> String {
    format(convert(amount, currency, rates), currency)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> RateTable {
        [("MUR", 1.0), ("EUR", 0.021), ("USD", 0.024)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_convert_multiplies_by_rate() {
        let rates = rates();
        for amount in [0.0, 1.0, 1234.5, 1_000_000.0] {
            for currency in Currency::ALL {
                let rate = rates.rate(currency).unwrap();
                assert_eq!(convert(amount, currency, &rates), amount * rate);
            }
        }
    }

    #[test]
    fn test_convert_missing_rate() {
        let rates: RateTable = [("MUR", 1.0)].into_iter().collect();
        assert!(convert(100.0, Currency::Euro, &rates).is_nan());
        assert_eq!(
            convert_with(100.0, Currency::Euro, &rates, Fallback::Unchanged),
            100.0
        );
    }

    #[test]
    fn test_format_scenario() {
        let rates = rates();
        assert_eq!(display(1_000_000.0, Currency::Euro, &rates), "€21,000.00");
        assert_eq!(display(1_000_000.0, Currency::Dollar, &rates), "$24,000.00");
        assert_eq!(
            display(1_000_000.0, Currency::Rupee, &rates),
            "MUR\u{a0}1,000,000.00"
        );
    }

    #[test]
    fn test_format_always_two_decimals() {
        for (amount, expected) in [
            (0.0, "$0.00"),
            (5.0, "$5.00"),
            (999.999, "$1,000.00"),
            (1234.5, "$1,234.50"),
            (123456789.126, "$123,456,789.13"),
            (-5.0, "-$5.00"),
            (-0.001, "$0.00"),
        ] {
            assert_eq!(format(amount, Currency::Dollar), expected);
        }
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format(f64::NAN, Currency::Euro), "N/A");
        assert_eq!(format(f64::INFINITY, Currency::Euro), "N/A");
    }

    #[test]
    fn test_rate_table_deserialization() {
        let table: RateTable = serde_json::from_str(r#"{"MUR": 1.0, "EUR": 0.02}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rate(Currency::Euro), Some(0.02));
        assert_eq!(table.rate(Currency::Dollar), None);
    }
}
