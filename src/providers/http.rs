use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::api::{HttpStatusError, PropertyApi};
use crate::core::cache::QueryParams;
use crate::core::config::ApiConfig;

/// [`PropertyApi`] over HTTP with reqwest.
pub struct HttpPropertyApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPropertyApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(HttpPropertyApi {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: builder.build().context("Failed to build HTTP client")?,
        })
    }

    fn url(&self, endpoint: &str, query: &QueryParams) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let pairs = query.iter().map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.as_str(), value)
        });
        Url::parse_with_params(&raw, pairs).with_context(|| format!("Invalid API URL: {raw}"))
    }

    async fn read_json(endpoint: &str, response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            return Err(HttpStatusError {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            }
            .into());
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {endpoint}"))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))
    }
}

#[async_trait]
impl PropertyApi for HttpPropertyApi {
    #[instrument(name = "ApiGet", skip(self, query), fields(endpoint = %endpoint))]
    async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value> {
        let url = self.url(endpoint, query)?;
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request error for URL: {url}"))?;

        Self::read_json(endpoint, response).await
    }

    #[instrument(name = "ApiPost", skip(self, body), fields(endpoint = %endpoint))]
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = self.url(endpoint, &QueryParams::new())?;
        debug!("Posting to {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request error for URL: {url}"))?;

        Self::read_json(endpoint, response).await
    }
}
