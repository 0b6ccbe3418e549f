//! Cross-cutting selection shared by every view.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tokio::sync::watch;
use tracing::debug;

/// Display currency selected by the user. Amounts from the API are in MUR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "Rs", alias = "MUR")]
    Rupee,
    #[serde(rename = "€", alias = "EUR")]
    Euro,
    #[serde(rename = "$", alias = "USD")]
    Dollar,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Rupee, Currency::Euro, Currency::Dollar];

    /// Symbol shown on the currency toggle.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Rupee => "Rs",
            Currency::Euro => "€",
            Currency::Dollar => "$",
        }
    }

    /// ISO code used as the rate table key.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Rupee => "MUR",
            Currency::Euro => "EUR",
            Currency::Dollar => "USD",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.symbol() == s || c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Invalid currency: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    All,
    West,
    East,
    North,
    South,
    Center,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::All,
        Region::West,
        Region::East,
        Region::North,
        Region::South,
        Region::Center,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::All => "All",
            Region::West => "West",
            Region::East => "East",
            Region::North => "North",
            Region::South => "South",
            Region::Center => "Center",
        }
    }

    pub fn is_all(&self) -> bool {
        *self == Region::All
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow!("Invalid region: {}", s))
    }
}

pub const ALL_PROPERTY_TYPES: &str = "All";

/// Immutable filter selection. Setters return an updated copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub currency: Currency,
    pub property_type: String,
    pub region: Region,
    pub location: Option<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            currency: Currency::default(),
            property_type: ALL_PROPERTY_TYPES.to_string(),
            region: Region::default(),
            location: None,
        }
    }
}

impl FilterState {
    pub fn with_currency(&self, currency: Currency) -> Self {
        FilterState {
            currency,
            ..self.clone()
        }
    }

    pub fn with_property_type(&self, property_type: impl Into<String>) -> Self {
        FilterState {
            property_type: property_type.into(),
            ..self.clone()
        }
    }

    /// Selecting a region always clears the location.
    pub fn with_region(&self, region: Region) -> Self {
        FilterState {
            region,
            location: None,
            ..self.clone()
        }
    }

    /// An empty string clears the location.
    pub fn with_location(&self, location: impl Into<String>) -> Self {
        let location = location.into();
        FilterState {
            location: (!location.is_empty()).then_some(location),
            ..self.clone()
        }
    }

    pub fn is_all_property_types(&self) -> bool {
        self.property_type == ALL_PROPERTY_TYPES
    }

    /// Property type as sent to the API; `None` for "All".
    pub fn property_type_param(&self) -> Option<&str> {
        (!self.is_all_property_types()).then_some(self.property_type.as_str())
    }

    /// Region as sent to the API; `None` for "All".
    pub fn region_param(&self) -> Option<&'static str> {
        (!self.region.is_all()).then_some(self.region.as_str())
    }

    /// Location only applies when a specific region is selected.
    pub fn location_param(&self) -> Option<&str> {
        if self.region.is_all() {
            return None;
        }
        self.location.as_deref()
    }
}

/// Holds the current [`FilterState`] and notifies subscribers when it changes.
pub struct FilterStore {
    sender: watch::Sender<FilterState>,
}

impl FilterStore {
    pub fn new(initial: FilterState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn current(&self) -> FilterState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.sender.subscribe()
    }

    pub fn set_currency(&self, currency: Currency) -> bool {
        self.update(|f| f.with_currency(currency))
    }

    pub fn set_property_type(&self, property_type: &str) -> bool {
        self.update(|f| f.with_property_type(property_type))
    }

    pub fn set_region(&self, region: Region) -> bool {
        self.update(|f| f.with_region(region))
    }

    pub fn set_location(&self, location: &str) -> bool {
        self.update(|f| f.with_location(location))
    }

    /// Applies `change` and notifies subscribers only if the state differs.
    fn update(&self, change: impl FnOnce(&FilterState) -> FilterState) -> bool {
        self.sender.send_if_modified(|state| {
            let next = change(state);
            if next == *state {
                return false;
            }
            debug!(?next, "Filter changed");
            *state = next;
            true
        })
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_change_clears_location() {
        let filter = FilterState::default()
            .with_region(Region::West)
            .with_location("Flic en Flac");
        assert_eq!(filter.location.as_deref(), Some("Flic en Flac"));

        for region in Region::ALL {
            assert!(filter.with_region(region).location.is_none());
        }
    }

    #[test]
    fn test_location_ignored_without_region() {
        let filter = FilterState::default().with_location("Grand Baie");
        assert_eq!(filter.location_param(), None);

        let filter = filter.with_region(Region::North).with_location("Grand Baie");
        assert_eq!(filter.location_param(), Some("Grand Baie"));

        assert!(filter.with_location("").location.is_none());
    }

    #[test]
    fn test_all_values_are_not_sent() {
        let filter = FilterState::default();
        assert_eq!(filter.property_type_param(), None);
        assert_eq!(filter.region_param(), None);

        let filter = filter
            .with_property_type("Apartment")
            .with_region(Region::South);
        assert_eq!(filter.property_type_param(), Some("Apartment"));
        assert_eq!(filter.region_param(), Some("South"));
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("Rs".parse::<Currency>().unwrap(), Currency::Rupee);
        assert_eq!("€".parse::<Currency>().unwrap(), Currency::Euro);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Dollar);
        assert!("GBP".parse::<Currency>().is_err());
        assert_eq!("center".parse::<Region>().unwrap(), Region::Center);
        assert!("Nowhere".parse::<Region>().is_err());
    }

    #[tokio::test]
    async fn test_store_notifies_on_change_only() {
        let store = FilterStore::default();
        let mut rx = store.subscribe();

        assert!(!store.set_currency(Currency::Rupee));
        assert!(!rx.has_changed().unwrap());

        assert!(store.set_region(Region::East));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().region, Region::East);

        store.set_location("Belle Mare");
        assert!(store.set_region(Region::East));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().location.is_none());
    }
}
