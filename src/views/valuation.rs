//! Price prediction for a described property. Predictions are never cached.

use crate::core::api::PropertyApi;
use crate::core::cache::QueryParams;
use crate::core::currency;
use crate::core::filter::FilterState;
use crate::core::view::{RenderContext, ViewSpec};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const PREDICT_ENDPOINT: &str = "predict/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    #[serde(rename = "type")]
    pub property_type: String,
    pub region: String,
    pub interior_surface: f64,
    pub land_surface: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub general_features: Vec<String>,
    /// Description features joined with `", "`.
    pub description: String,
}

impl ValuationRequest {
    pub fn new(property_type: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            property_type: property_type.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_surfaces(mut self, interior: f64, land: f64) -> Self {
        self.interior_surface = interior;
        self.land_surface = land;
        self
    }

    pub fn with_rooms(mut self, bedrooms: u32, bathrooms: u32) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }

    pub fn with_general_features(mut self, features: Vec<String>) -> Self {
        self.general_features = features;
        self
    }

    pub fn with_description_features(mut self, features: &[String]) -> Self {
        self.description = features.join(", ");
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.property_type.trim().is_empty() {
            bail!("A property type is required");
        }
        if self.region.trim().is_empty() {
            bail!("A region is required");
        }
        for (name, value) in [
            ("interior surface", self.interior_surface),
            ("land surface", self.land_surface),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("Invalid {name}: {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// In MUR.
    pub predicted_price: f64,
}

impl Prediction {
    pub fn display(&self, ctx: &RenderContext<'_>) -> String {
        currency::display(self.predicted_price, ctx.currency, ctx.rates)
    }
}

pub struct Valuator {
    api: Arc<dyn PropertyApi>,
}

impl Valuator {
    pub fn new(api: Arc<dyn PropertyApi>) -> Self {
        Self { api }
    }

    pub async fn predict(&self, request: &ValuationRequest) -> Result<Prediction> {
        request.validate()?;
        let body = serde_json::to_value(request).context("Failed to encode valuation request")?;
        debug!(property_type = %request.property_type, region = %request.region, "Requesting valuation");

        let response = self
            .api
            .post(PREDICT_ENDPOINT, &body)
            .await
            .context("Valuation request failed")?;
        let prediction: Prediction = serde_json::from_value(response)
            .context("Failed to parse valuation response")?;
        if !prediction.predicted_price.is_finite() {
            return Err(anyhow!("Valuation returned a non-finite price"));
        }

        info!(price = prediction.predicted_price, "Valuation received");
        Ok(prediction)
    }
}

/// Choices offered by the valuation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOptions {
    #[serde(default)]
    pub general_features: Vec<String>,
    #[serde(default)]
    pub description_features: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl FeatureOptions {
    /// Names in `requested` that the form does not offer.
    pub fn unknown_general<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|f| !self.general_features.contains(*f))
            .map(String::as_str)
            .collect()
    }
}

pub struct DistinctFeaturesView;

impl ViewSpec for DistinctFeaturesView {
    type Raw = FeatureOptions;
    type Model = FeatureOptions;

    fn namespace(&self) -> &'static str {
        "distinctFeatures"
    }

    fn endpoint(&self) -> String {
        "distinct_features/".to_string()
    }

    fn query(&self, _filter: &FilterState) -> QueryParams {
        QueryParams::new()
    }

    fn shape(&self, raw: &FeatureOptions, _ctx: &RenderContext<'_>) -> FeatureOptions {
        raw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::CachePolicy;
    use crate::core::currency::RateTable;
    use crate::core::filter::Currency;
    use crate::core::view::ViewAdapter;
    use crate::core::view::test_support::MockApi;
    use serde_json::json;

    fn request() -> ValuationRequest {
        ValuationRequest::new("Villa", "West")
            .with_surfaces(250.0, 800.0)
            .with_rooms(4, 3)
            .with_general_features(vec!["Garden".to_string()])
            .with_description_features(&["Private pool".to_string(), "Beachfront".to_string()])
    }

    #[test]
    fn test_request_payload() {
        let body = serde_json::to_value(request()).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "Villa",
                "region": "West",
                "interior_surface": 250.0,
                "land_surface": 800.0,
                "bedrooms": 4,
                "bathrooms": 3,
                "general_features": ["Garden"],
                "description": "Private pool, Beachfront"
            })
        );
    }

    #[test]
    fn test_validation() {
        assert!(request().validate().is_ok());
        assert!(ValuationRequest::new("", "West").validate().is_err());
        assert!(
            request()
                .with_surfaces(f64::NAN, 0.0)
                .validate()
                .is_err()
        );
        assert!(request().with_surfaces(10.0, -1.0).validate().is_err());
    }

    #[tokio::test]
    async fn test_predict() {
        let api = Arc::new(MockApi::new().respond("predict/", json!({"predicted_price": 25000000.0})));
        let valuator = Valuator::new(api.clone());

        let prediction = valuator.predict(&request()).await.unwrap();
        assert_eq!(prediction.predicted_price, 25_000_000.0);

        // Not cached: a second identical request goes to the API again.
        valuator.predict(&request()).await.unwrap();
        assert_eq!(api.call_count(), 2);

        let rates: RateTable = [("MUR", 1.0), ("EUR", 0.02)].into_iter().collect();
        assert_eq!(
            prediction.display(&RenderContext::new(Currency::Euro, &rates)),
            "€500,000.00"
        );
    }

    #[tokio::test]
    async fn test_predict_errors() {
        let valuator = Valuator::new(Arc::new(MockApi::new()));
        let err = valuator.predict(&request()).await.unwrap_err();
        assert!(format!("{err:#}").contains("Valuation request failed"));

        let api = Arc::new(MockApi::new().respond("predict/", json!({"error": "model missing"})));
        let err = Valuator::new(api).predict(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse valuation response"));

        let invalid = ValuationRequest::new("Villa", "");
        let api = Arc::new(MockApi::new());
        assert!(Valuator::new(api.clone()).predict(&invalid).await.is_err());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_feature_options() {
        let api = Arc::new(MockApi::new().respond(
            "distinct_features/",
            json!({
                "general_features": ["Garden", "Garage"],
                "property_types": ["Villa"],
                "regions": ["West", "North"]
            }),
        ));
        let view = ViewAdapter::new(DistinctFeaturesView, api, CachePolicy::default());
        view.refresh(&FilterState::default()).await;

        let rates = RateTable::default();
        let options = view.render(&RenderContext::new(Currency::Rupee, &rates)).await;
        assert_eq!(options.regions, vec!["West", "North"]);
        assert!(options.description_features.is_empty());
        assert_eq!(
            options.unknown_general(&["Garage".to_string(), "Helipad".to_string()]),
            vec!["Helipad"]
        );
    }
}
