//! Build session - one user's walk through the categories.
//!
//! Each session owns:
//! - The budget profile (fixed for the session)
//! - The build ledger
//! - The tag of the single in-flight candidate request
//! - The candidates currently shown
//!
//! Every candidate request is tagged with its category, the ledger version it
//! was computed from and a sequence number. A response is only applied while
//! its tag is still current, so a late reply for a category the user already
//! left can never reach the ledger or the screen.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::budget::{allocate, Allocation, BudgetProfile, BuildLedger, ComponentCategory, UsageProfile};
use crate::catalog::{CandidateBatch, CandidateRequest, PartCandidate};

/// Identity of one candidate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RequestTag {
    pub category: ComponentCategory,
    pub ledger_version: u64,
    pub sequence: u64,
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@v{}#{}",
            self.category.slug(),
            self.ledger_version,
            self.sequence
        )
    }
}

/// Everything needed to fetch candidates for one category.
#[derive(Debug, Clone)]
pub struct ShoppingRequest {
    pub tag: RequestTag,
    pub allocation: Allocation,
    pub request: CandidateRequest,
    /// Cancelled when the user navigates away or starts another request.
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Stale response for {tag}; the session has moved on")]
    StaleResponse { tag: RequestTag },

    #[error("Candidate request {tag} was cancelled")]
    Cancelled { tag: RequestTag },

    #[error("Batch for {got} does not match request for {expected}")]
    CategoryMismatch {
        expected: ComponentCategory,
        got: ComponentCategory,
    },

    #[error("Unknown candidate: {0}")]
    UnknownCandidate(String),
}

/// End-of-build overview.
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub usage: UsageProfile,
    pub ceiling: u64,
    pub parts: Vec<(ComponentCategory, PartCandidate)>,
    pub missing: Vec<ComponentCategory>,
    pub total: u64,
    /// Ceiling minus total; negative when over budget.
    pub remaining: i64,
    pub within_ceiling: bool,
}

/// State of one build, handed in and out explicitly by the caller.
#[derive(Debug)]
pub struct BuildSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    profile: BudgetProfile,
    ledger: BuildLedger,
    sequence: u64,
    current: Option<RequestTag>,
    cancel: Option<CancellationToken>,
    candidates: Option<CandidateBatch>,
}

impl BuildSession {
    pub fn new(profile: BudgetProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            profile,
            ledger: BuildLedger::new(),
            sequence: 0,
            current: None,
            cancel: None,
            candidates: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &BudgetProfile {
        &self.profile
    }

    pub fn ledger(&self) -> &BuildLedger {
        &self.ledger
    }

    pub fn current_request(&self) -> Option<RequestTag> {
        self.current
    }

    /// Candidates shown for the current request, if they have arrived.
    pub fn candidates(&self) -> Option<&CandidateBatch> {
        self.candidates.as_ref()
    }

    /// Next category without a selection, in wizard order.
    pub fn next_category(&self) -> Option<ComponentCategory> {
        self.ledger.remaining_categories().into_iter().next()
    }

    /// Whether a response tagged `tag` may still be applied.
    pub fn is_current(&self, tag: &RequestTag) -> bool {
        self.current.as_ref() == Some(tag) && tag.ledger_version == self.ledger.version()
    }

    /// Start shopping for `category`, superseding any in-flight request.
    pub fn begin_shopping(&mut self, category: ComponentCategory) -> ShoppingRequest {
        self.abandon();

        self.sequence += 1;
        let tag = RequestTag {
            category,
            ledger_version: self.ledger.version(),
            sequence: self.sequence,
        };
        let allocation = allocate(&self.profile, &self.ledger, category);
        let request = CandidateRequest::new(&self.profile, &self.ledger, &allocation);
        let cancel = CancellationToken::new();

        self.current = Some(tag);
        self.cancel = Some(cancel.clone());

        tracing::info!(
            session_id = %self.id,
            tag = %tag,
            band_min = allocation.band.min,
            band_max = allocation.band.max,
            "Shopping for category"
        );

        ShoppingRequest {
            tag,
            allocation,
            request,
            cancel,
        }
    }

    fn check_current(&self, tag: &RequestTag) -> Result<(), SessionError> {
        if self.is_current(tag) {
            Ok(())
        } else {
            tracing::info!(
                session_id = %self.id,
                tag = %tag,
                current = ?self.current.map(|t| t.to_string()),
                "Dropping stale candidate response"
            );
            Err(SessionError::StaleResponse { tag: *tag })
        }
    }

    /// Show `batch` if `tag` is still the current request.
    pub fn accept(&mut self, tag: &RequestTag, batch: CandidateBatch) -> Result<&CandidateBatch, SessionError> {
        self.check_current(tag)?;
        if batch.category != tag.category {
            return Err(SessionError::CategoryMismatch {
                expected: tag.category,
                got: batch.category,
            });
        }
        Ok(self.candidates.insert(batch))
    }

    /// Put a shown candidate into the ledger and close the request.
    ///
    /// Returns the part it replaced, if any.
    pub fn choose(&mut self, tag: &RequestTag, candidate_id: &str) -> Result<Option<PartCandidate>, SessionError> {
        self.check_current(tag)?;
        let part = self
            .candidates
            .as_ref()
            .and_then(|batch| batch.get(candidate_id))
            .cloned()
            .ok_or_else(|| SessionError::UnknownCandidate(candidate_id.to_string()))?;

        tracing::info!(
            session_id = %self.id,
            category = %tag.category,
            part = %part.name,
            price = part.price,
            "Part selected"
        );

        let replaced = self.ledger.select(tag.category, part);
        self.current = None;
        self.cancel = None;
        self.candidates = None;
        Ok(replaced)
    }

    /// Leave the current category; any in-flight request is cancelled.
    pub fn abandon(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.current = None;
        self.candidates = None;
    }

    /// Throw away every selection and start a new build with the same profile.
    pub fn restart(&mut self) {
        self.abandon();
        self.ledger.clear();
        self.started_at = Utc::now();
    }

    pub fn summary(&self) -> BuildSummary {
        let total = self.ledger.spent();
        let ceiling = self.profile.ceiling();
        let remaining = i64::try_from(i128::from(ceiling) - i128::from(total))
            .unwrap_or(if total > ceiling { i64::MIN } else { i64::MAX });
        BuildSummary {
            session_id: self.id,
            started_at: self.started_at,
            usage: self.profile.usage(),
            ceiling,
            parts: self
                .ledger
                .iter()
                .map(|(c, p)| (c, p.clone()))
                .collect(),
            missing: self.ledger.remaining_categories().into_iter().collect(),
            total,
            remaining,
            within_ceiling: total <= ceiling,
        }
    }
}
