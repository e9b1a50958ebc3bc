//! Configuration management.
//!
//! Configuration is read from environment variables:
//! - `OPENROUTER_API_KEY` - Optional. Without it no candidate source is configured
//!   and every category is served fallback candidates.
//! - `PC_ARCHITECT_MODEL` - Optional. Model used for recommendations.
//!   Defaults to `google/gemini-2.5-flash`.
//! - `OPENROUTER_BASE_URL` - Optional. OpenAI-compatible API base URL.
//! - `PC_ARCHITECT_STRICT_BAND` - Optional. `true` drops source offers outside the band.
//! - `PC_ARCHITECT_TIMEOUT_SECS` - Optional. Recommendation request timeout. Defaults to 30.
//! - `PC_ARCHITECT_SEARCH_URL` - Optional. Base URL for generated product search links.
//! - `PC_ARCHITECT_AFFILIATE_TAG` - Optional. Appended to search links as `tag=`.

use std::time::Duration;

use crate::budget::ConfigError;
use crate::catalog::{BandPolicy, LinkBuilder, DEFAULT_SEARCH_URL};
use crate::llm::{OpenRouterClient, DEFAULT_BASE_URL};

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the recommendation model; `None` disables the source.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub band_policy: BandPolicy,
    pub request_timeout: Duration,
    pub search_url: String,
    pub affiliate_tag: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            band_policy: BandPolicy::Advisory,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            affiliate_tag: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, so tests need not touch the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let strict = match non_empty(lookup("PC_ARCHITECT_STRICT_BAND")) {
            Some(v) => parse_bool("PC_ARCHITECT_STRICT_BAND", &v)?,
            None => false,
        };
        let band_policy = if strict {
            BandPolicy::Strict
        } else {
            BandPolicy::Advisory
        };

        let request_timeout = match non_empty(lookup("PC_ARCHITECT_TIMEOUT_SECS")) {
            Some(v) => {
                let secs = v
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: "PC_ARCHITECT_TIMEOUT_SECS".to_string(),
                        value: v.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_key: non_empty(lookup("OPENROUTER_API_KEY")),
            model: non_empty(lookup("PC_ARCHITECT_MODEL")).unwrap_or(defaults.model),
            base_url: non_empty(lookup("OPENROUTER_BASE_URL")).unwrap_or(defaults.base_url),
            band_policy,
            request_timeout,
            search_url: non_empty(lookup("PC_ARCHITECT_SEARCH_URL")).unwrap_or(defaults.search_url),
            affiliate_tag: non_empty(lookup("PC_ARCHITECT_AFFILIATE_TAG")),
        })
    }

    pub fn has_source(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn link_builder(&self) -> LinkBuilder {
        LinkBuilder::new(self.search_url.clone(), self.affiliate_tag.clone())
    }

    /// Build the LLM client, if an API key is configured.
    pub fn llm_client(&self) -> anyhow::Result<Option<OpenRouterClient>> {
        let Some(key) = &self.api_key else {
            return Ok(None);
        };
        Ok(Some(OpenRouterClient::with_timeout(
            key.clone(),
            self.base_url.clone(),
            self.request_timeout,
        )?))
    }
}
