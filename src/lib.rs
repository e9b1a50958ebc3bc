//! # PC Architect
//!
//! Budget-bounded PC build planning, one component category at a time.
//!
//! ## Architecture
//!
//! ```text
//! BudgetProfile + BuildLedger + category
//!        │
//!        ▼
//!   budget::allocate ──► PriceBand
//!        │
//!        ▼
//!   CandidateSource (LLM, injected) ──► offers | SourceError
//!        │
//!        ▼
//!   CandidateValidator ──► CandidateBatch (repaired or fallback, never empty)
//!        │
//!        ▼
//!   BuildSession::accept / choose ──► updated BuildLedger
//! ```
//!
//! The allocation engine and ledger are pure and synchronous. The only
//! suspending step is the candidate source call, and its result is applied
//! only while the request that produced it is still current.

pub mod architect;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod llm;
pub mod session;

pub use architect::Architect;
pub use budget::{allocate, Allocation, BudgetProfile, BuildLedger, ComponentCategory, PriceBand, UsageProfile};
pub use catalog::{CandidateBatch, CandidateSource, CandidateValidator, PartCandidate};
pub use config::Config;
pub use session::{BuildSession, BuildSummary, RequestTag, SessionError};
