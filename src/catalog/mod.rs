//! Catalog module - candidate offers and where they come from.
//!
//! # Key Concepts
//! - PartCandidate: an offer the user can pick for one category
//! - CandidateSource: external recommender asked for offers inside a price band
//! - Validator: repairs source offers, or synthesizes fallback offers when the source fails
//! - Query: filter/sort applied to a candidate list for display

mod llm_source;
mod query;
mod validator;

pub use llm_source::{parse_recommendations, render_prompt, LlmCandidateSource, SYSTEM_PROMPT};
pub use query::{CandidateQuery, SortOrder};
pub use validator::{
    parse_price, price_cap, BandPolicy, CandidateBatch, CandidateOrigin, CandidateValidator,
    FallbackReason, LinkBuilder, DEFAULT_SEARCH_URL, MAX_PRICE_MULTIPLE,
};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::budget::{Allocation, BudgetProfile, BuildLedger, ComponentCategory, PriceBand, UsageProfile};

/// An offer for one category. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCandidate {
    pub id: String,
    pub name: String,
    /// Price in whole rupees.
    pub price: u64,
    /// Attribute name to display value.
    pub specs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
}

impl PartCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            specs: BTreeMap::new(),
            compatibility_note: None,
            source_link: None,
        }
    }

    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specs.insert(key.into(), value.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.compatibility_note = Some(note.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.source_link = Some(link.into());
        self
    }
}

/// An offer as returned by the candidate source, before validation.
///
/// Prices and spec values are kept as raw JSON because recommenders are loose
/// about types ("₹12,999", 12999, "12999.0").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: serde_json::Value,
    #[serde(default)]
    pub specs: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Wire shape of a source response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

/// A part already in the ledger, summarized for the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedPartSummary {
    pub category: ComponentCategory,
    pub name: String,
    pub price: u64,
    pub specs: BTreeMap<String, String>,
}

/// What the candidate source is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRequest {
    pub category: ComponentCategory,
    pub band: PriceBand,
    pub usage: UsageProfile,
    pub ceiling: u64,
    pub spent: u64,
    pub remaining_budget: i64,
    pub selected_parts: Vec<SelectedPartSummary>,
    pub future_categories: Vec<ComponentCategory>,
}

impl CandidateRequest {
    pub fn new(profile: &BudgetProfile, ledger: &BuildLedger, allocation: &Allocation) -> Self {
        Self {
            category: allocation.category,
            band: allocation.band,
            usage: profile.usage(),
            ceiling: allocation.ceiling,
            spent: allocation.spent,
            remaining_budget: allocation.remaining_budget,
            selected_parts: ledger
                .iter()
                .map(|(category, part)| SelectedPartSummary {
                    category,
                    name: part.name.clone(),
                    price: part.price,
                    specs: part.specs.clone(),
                })
                .collect(),
            future_categories: allocation.future_categories.clone(),
        }
    }
}

/// Why the candidate source produced nothing usable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("No candidate source configured")]
    NotConfigured,

    #[error("Candidate source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed candidate response: {0}")]
    Malformed(String),
}

/// External recommender of offers for one category.
///
/// # Invariants
/// - `recommend()` never panics; every failure is a `SourceError`
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Ask for offers inside `request.band`. One attempt, no retries.
    async fn recommend(&self, request: &CandidateRequest) -> Result<Vec<Recommendation>, SourceError>;
}
