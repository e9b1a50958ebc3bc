//! Budget module - spending ceiling, selections and per-category allocation.
//!
//! # Key Concepts
//! - Profile: the ceiling and the usage ratio table for one build session
//! - Ledger: what has been chosen so far and the running total
//! - Allocation: the price band for the category currently being shopped

mod allocation;
mod ledger;
mod profile;

pub use allocation::{
    allocate, Allocation, PriceBand, BAND_LOWER_PERCENT, BAND_UPPER_PERCENT, MIN_TARGET,
    SURPLUS_SHARE_PERCENT,
};
pub use ledger::BuildLedger;
pub use profile::{
    resolve_ceiling, BudgetProfile, BudgetTier, ComponentCategory, ConfigError, RatioTable,
    UsageProfile, BASIS_POINTS, DEFAULT_CEILING, DEFAULT_SHARE_BP,
};
