//! Architect - top-level coordinator of a candidate fetch.
//!
//! # Responsibilities
//! 1. Compute the price band for the category being shopped
//! 2. Ask the candidate source (if one is configured) for offers in that band
//! 3. Repair the offers, or synthesize fallbacks on any source failure
//! 4. Hand the batch back to the session only if its request is still current
//!
//! # Fetch Flow
//! ```text
//! session.begin_shopping(category)  -> tag + allocation + cancel token
//! source.recommend(request)         -> offers | SourceError   (one attempt)
//! validator.resolve(allocation, ..) -> CandidateBatch (never empty)
//! session.accept(tag, batch)        -> shown | StaleResponse
//! ```

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::budget::{allocate, BudgetProfile, BuildLedger, ComponentCategory};
use crate::catalog::{
    CandidateBatch, CandidateRequest, CandidateSource, CandidateValidator, LlmCandidateSource,
    Recommendation, SourceError,
};
use crate::config::Config;
use crate::session::{BuildSession, SessionError, ShoppingRequest};

/// Coordinates allocation, the candidate source and validation.
///
/// Holds no per-session state; one instance can serve any number of sessions.
pub struct Architect {
    source: Option<Arc<dyn CandidateSource>>,
    validator: CandidateValidator,
}

impl Architect {
    pub fn new(source: Option<Arc<dyn CandidateSource>>, validator: CandidateValidator) -> Self {
        Self { source, validator }
    }

    /// An architect with no source; every batch is synthesized.
    pub fn offline(validator: CandidateValidator) -> Self {
        Self::new(None, validator)
    }

    /// Wire up the OpenRouter-backed source described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let validator = CandidateValidator::new(config.band_policy, config.link_builder());
        let source: Option<Arc<dyn CandidateSource>> = match config.llm_client()? {
            Some(client) => Some(Arc::new(LlmCandidateSource::new(
                Arc::new(client),
                config.model.clone(),
            ))),
            None => {
                tracing::warn!("OPENROUTER_API_KEY not set; serving fallback candidates only");
                None
            }
        };
        Ok(Self::new(source, validator))
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// One attempt against the source.
    async fn consult(&self, request: &CandidateRequest) -> Result<Vec<Recommendation>, SourceError> {
        let Some(source) = &self.source else {
            return Err(SourceError::NotConfigured);
        };

        let outcome = source.recommend(request).await;
        match &outcome {
            Ok(offers) => tracing::info!(
                source = source.name(),
                category = %request.category,
                offers = offers.len(),
                "Candidate source responded"
            ),
            Err(e) => tracing::warn!(
                source = source.name(),
                category = %request.category,
                error = %e,
                "Candidate source failed"
            ),
        }
        outcome
    }

    /// Candidates for `category` given the current ledger.
    ///
    /// Always returns at least one candidate.
    pub async fn get_candidates(
        &self,
        profile: &BudgetProfile,
        ledger: &BuildLedger,
        category: ComponentCategory,
    ) -> CandidateBatch {
        let allocation = allocate(profile, ledger, category);
        let request = CandidateRequest::new(profile, ledger, &allocation);
        let outcome = self.consult(&request).await;
        self.validator.resolve(&allocation, outcome)
    }

    /// Fetch candidates for a tagged request.
    ///
    /// Returns `None` if the request is cancelled before the source answers.
    pub async fn fetch(&self, request: &ShoppingRequest) -> Option<CandidateBatch> {
        tokio::select! {
            biased;
            _ = request.cancel.cancelled() => {
                tracing::info!(tag = %request.tag, "Candidate request cancelled");
                None
            }
            outcome = self.consult(&request.request) => {
                Some(self.validator.resolve(&request.allocation, outcome))
            }
        }
    }

    /// Begin shopping `category` in `session`, fetch, and show the result.
    ///
    /// The session lock is not held while the source is working, so the user
    /// can navigate away meanwhile; the late result is then rejected.
    pub async fn shop(
        &self,
        session: &RwLock<BuildSession>,
        category: ComponentCategory,
    ) -> Result<CandidateBatch, SessionError> {
        let request = session.write().await.begin_shopping(category);

        let Some(batch) = self.fetch(&request).await else {
            return Err(SessionError::Cancelled { tag: request.tag });
        };

        let mut guard = session.write().await;
        guard.accept(&request.tag, batch).cloned()
    }
}
