use serde::{Deserialize, Serialize};

use crate::error::{ModelIntelError, Result};

pub const LEARN_MCP_URL: &str = "https://learn.microsoft.com/api/mcp";
pub const RETIREMENTS_URL: &str =
    "https://learn.microsoft.com/en-us/azure/ai-foundry/openai/concepts/model-retirements";
pub const AVAILABILITY_URL: &str = "https://learn.microsoft.com/en-us/azure/ai-foundry/foundry-models/concepts/models-sold-directly-by-azure?view=foundry-classic&tabs=global-standard-aoai%2Cglobal-standard&pivots=azure-openai";
pub const WHATS_NEW_URL: &str =
    "https://learn.microsoft.com/en-us/azure/ai-foundry/openai/whats-new?view=foundry-classic";
pub const RETAIL_PRICES_URL: &str = "https://prices.azure.com/api/retail/prices";

/// Runtime settings. Every field has a default, so an empty file (or no
/// file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub learn_mcp_url: String,
    pub retirements_url: String,
    pub availability_url: String,
    pub whats_new_url: String,
    pub retail_prices_url: String,
    /// Region used by `pricing` when none is given.
    pub default_region: String,
    /// How long fetched documents stay fresh in the cache.
    pub cache_ttl_secs: u64,
    pub region_discovery_pages: usize,
    pub max_pricing_pages: usize,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learn_mcp_url: LEARN_MCP_URL.to_string(),
            retirements_url: RETIREMENTS_URL.to_string(),
            availability_url: AVAILABILITY_URL.to_string(),
            whats_new_url: WHATS_NEW_URL.to_string(),
            retail_prices_url: RETAIL_PRICES_URL.to_string(),
            default_region: "swedencentral".to_string(),
            cache_ttl_secs: 3600,
            region_discovery_pages: 5,
            max_pricing_pages: 50,
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse config from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| ModelIntelError::Config(e.to_string()))
    }

    /// `$MODEL_INTEL_CONFIG`, else `<config dir>/model-intel/config.toml`.
    #[cfg(feature = "network")]
    pub fn path() -> Option<std::path::PathBuf> {
        if let Ok(p) = std::env::var("MODEL_INTEL_CONFIG") {
            return Some(p.into());
        }
        Some(dirs::config_dir()?.join("model-intel").join("config.toml"))
    }

    /// Load config from disk, falling back to defaults when there is no
    /// file. A file that exists but doesn't parse is an error.
    #[cfg(feature = "network")]
    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::parse(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ModelIntelError::Io(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let cfg = Config::parse(
            r#"
default_region = "eastus2"
cache_ttl_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(cfg.default_region, "eastus2");
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.region_discovery_pages, 5);
        assert_eq!(cfg.retail_prices_url, RETAIL_PRICES_URL);
    }

    #[test]
    fn unknown_key_rejected() {
        let err = Config::parse("defualt_region = \"x\"").unwrap_err();
        assert!(matches!(err, ModelIntelError::Config(_)));
    }

    #[test]
    fn wrong_type_rejected() {
        assert!(Config::parse("cache_ttl_secs = \"soon\"").is_err());
    }
}
