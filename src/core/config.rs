use crate::core::cache::CachePolicy;
use crate::core::currency::RateTable;
use crate::core::filter::{ALL_PROPERTY_TYPES, Currency, FilterState, Region};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Upper bound for every request; views may set a tighter one.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: "estatedash/0.1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let policy = CachePolicy::default();
        CacheConfig {
            capacity: policy.capacity,
            ttl_secs: policy.ttl.map(|ttl| ttl.as_secs()),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            capacity: self.capacity,
            ttl: self.ttl_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FilterDefaults {
    pub currency: Currency,
    pub property_type: String,
    pub region: Region,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        FilterDefaults {
            currency: Currency::default(),
            property_type: ALL_PROPERTY_TYPES.to_string(),
            region: Region::default(),
        }
    }
}

impl FilterDefaults {
    pub fn filter(&self) -> FilterState {
        FilterState::default()
            .with_currency(self.currency)
            .with_property_type(self.property_type.clone())
            .with_region(self.region)
    }
}

fn default_fallback_rates() -> RateTable {
    [("MUR", 1.0), ("EUR", 0.021), ("USD", 0.024)]
        .into_iter()
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub defaults: FilterDefaults,
    /// Used when the exchange rate endpoint is unavailable.
    #[serde(default = "default_fallback_rates")]
    pub fallback_rates: RateTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            defaults: FilterDefaults::default(),
            fallback_rates: default_fallback_rates(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("mu", "estatedash", "estatedash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
api:
  base_url: "http://example.com/api"
  timeout_secs: 5
cache:
  capacity: 10
  ttl_secs: 60
defaults:
  currency: "€"
  property_type: "Apartment"
  region: "West"
fallback_rates:
  MUR: 1.0
  EUR: 0.02
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.api.base_url, "http://example.com/api");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.api.user_agent, "estatedash/0.1");

        let policy = config.cache.policy();
        assert_eq!(policy.capacity, 10);
        assert_eq!(policy.ttl, Some(Duration::from_secs(60)));

        let filter = config.defaults.filter();
        assert_eq!(filter.currency, Currency::Euro);
        assert_eq!(filter.property_type, "Apartment");
        assert_eq!(filter.region, Region::West);
        assert!(filter.location.is_none());

        assert_eq!(config.fallback_rates.rate(Currency::Euro), Some(0.02));
        assert_eq!(config.fallback_rates.rate(Currency::Dollar), None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.defaults.filter(), FilterState::default());
        assert_eq!(config.fallback_rates.rate(Currency::Dollar), Some(0.024));
    }

    #[test]
    fn test_currency_accepts_iso_code() {
        let config: AppConfig =
            serde_yaml::from_str("defaults:\n  currency: USD\n").expect("Failed to deserialize");
        assert_eq!(config.defaults.currency, Currency::Dollar);
    }
}
