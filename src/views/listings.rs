use crate::core::cache::{QueryBuilder, QueryParams};
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use crate::views::{format_area, format_date, lenient_f64};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    #[default]
    DateAdded,
    Price,
    InteriorSurface,
}

impl ListingSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingSort::DateAdded => "date_added",
            ListingSort::Price => "price",
            ListingSort::InteriorSurface => "interior_surface",
        }
    }
}

impl FromStr for ListingSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_added" | "newest" => Ok(ListingSort::DateAdded),
            "price" => Ok(ListingSort::Price),
            "interior_surface" | "size" => Ok(ListingSort::InteriorSurface),
            other => bail!("Unknown listing sort: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub details_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub interior_surface: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestListings {
    #[serde(default)]
    pub latest_properties: Vec<Listing>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingCard {
    pub title: String,
    pub location: String,
    pub price: String,
    pub interior_size: String,
    pub link: Option<String>,
}

/// Listings added during the last week.
#[derive(Debug, Clone, Default)]
pub struct LatestListingsView {
    pub sort: ListingSort,
}

impl ViewSpec for LatestListingsView {
    type Raw = LatestListings;
    type Model = Vec<ListingCard>;

    fn namespace(&self) -> &'static str {
        "latestProperties"
    }

    fn endpoint(&self) -> String {
        "latest-properties/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("property_type", filter.property_type_param())
            .param("region", filter.region_param())
            .param("sort_by", self.sort.as_str())
            .build()
    }

    fn shape(&self, raw: &LatestListings, ctx: &RenderContext<'_>) -> Vec<ListingCard> {
        raw.latest_properties
            .iter()
            .map(|listing| ListingCard {
                title: listing.title.clone(),
                location: listing.location.clone(),
                price: currency::display(
                    listing.price.unwrap_or(f64::NAN),
                    ctx.currency,
                    ctx.rates,
                ),
                interior_size: format_area(listing.interior_surface.filter(|s| *s > 0.0)),
                link: listing.details_link.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldProperty {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub interior_surface: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub land_surface: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoldRow {
    pub title: String,
    pub date: String,
    pub location: String,
    pub price: String,
    pub agency: String,
    pub kind: String,
    pub interior_size: String,
    pub land_size: String,
}

pub struct SoldPropertiesView;

impl ViewSpec for SoldPropertiesView {
    type Raw = Vec<SoldProperty>;
    type Model = Vec<SoldRow>;

    fn namespace(&self) -> &'static str {
        "soldProperties"
    }

    fn endpoint(&self) -> String {
        "sold-properties/".to_string()
    }

    fn query(&self, filter: &FilterState) -> QueryParams {
        QueryBuilder::new()
            .param("property_type", filter.property_type_param())
            .param("region", filter.region_param())
            .build()
    }

    fn shape(&self, raw: &Vec<SoldProperty>, ctx: &RenderContext<'_>) -> Vec<SoldRow> {
        raw.iter()
            .map(|sold| SoldRow {
                title: sold.title.clone(),
                date: sold.date_added.as_deref().map(format_date).unwrap_or_default(),
                location: sold.location.clone(),
                price: currency::display(sold.price.unwrap_or(f64::NAN), ctx.currency, ctx.rates),
                agency: sold.agency_name.clone().unwrap_or_default(),
                kind: sold.kind.clone().unwrap_or_default(),
                interior_size: format_area(sold.interior_surface),
                land_size: format_area(sold.land_surface),
            })
            .collect()
    }
}
