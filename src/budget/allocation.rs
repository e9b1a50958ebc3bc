//! Allocation engine - the acceptable price band for the category being shopped.
//!
//! # Algorithm
//! ```text
//! remaining  = ceiling - spent
//! reserved   = sum of fair shares of every unselected category except the current one
//! available  = remaining - reserved
//! ideal      = fair share of the current category
//! target     = min(ideal, available)
//!              or ideal + (available - ideal) / 2 when available > ideal
//! target     = max(target, MIN_TARGET)
//! band       = [target * 85%, target * 115%]
//! ```
//!
//! Reserving fair shares for later categories keeps early choices from eating the
//! whole ceiling; granting only half of any surplus leaves slack for the rest.

use serde::{Deserialize, Serialize};

use super::ledger::BuildLedger;
use super::profile::{BudgetProfile, ComponentCategory};

/// Smallest target price the engine will hand out, in rupees.
pub const MIN_TARGET: u64 = 1_500;

/// Lower edge of the band, in percent of the target.
pub const BAND_LOWER_PERCENT: u64 = 85;

/// Upper edge of the band, in percent of the target.
pub const BAND_UPPER_PERCENT: u64 = 115;

/// Percentage of any surplus granted to the current category.
pub const SURPLUS_SHARE_PERCENT: i64 = 50;

/// Inclusive price window for one category.
///
/// # Invariants
/// - `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: u64,
    pub max: u64,
}

impl PriceBand {
    /// The ±15% window around `target`.
    pub fn around(target: u64) -> Self {
        Self {
            min: percent_of(target, BAND_LOWER_PERCENT),
            max: percent_of(target, BAND_UPPER_PERCENT),
        }
    }

    pub fn contains(&self, price: u64) -> bool {
        (self.min..=self.max).contains(&price)
    }
}

fn percent_of(amount: u64, percent: u64) -> u64 {
    u64::try_from(u128::from(amount) * u128::from(percent) / 100).unwrap_or(u64::MAX)
}

/// Result of one allocation, with every intermediate quantity kept for callers
/// that need to explain the band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub category: ComponentCategory,
    pub ceiling: u64,
    pub spent: u64,
    /// Ceiling minus spent; negative once the ledger is already over budget.
    pub remaining_budget: i64,
    /// Unselected categories other than the current one, in wizard order.
    pub future_categories: Vec<ComponentCategory>,
    pub reserved_for_future: i64,
    pub available_for_current: i64,
    pub ideal_allocation: i64,
    /// Target price after surplus blending and the floor clamp.
    pub target: u64,
    pub band: PriceBand,
}

impl Allocation {
    /// Budget left over once this band's maximum has been spent.
    pub fn headroom(&self) -> i64 {
        self.remaining_budget.saturating_sub(to_signed(self.band.max))
    }

    /// Whether earlier choices left money on the table for this category.
    pub fn has_surplus(&self) -> bool {
        self.available_for_current > self.ideal_allocation
    }
}

fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Compute the price band for `category`.
///
/// Pure: the same profile, ledger and category always give the same allocation.
pub fn allocate(
    profile: &BudgetProfile,
    ledger: &BuildLedger,
    category: ComponentCategory,
) -> Allocation {
    let ceiling = profile.ceiling();
    let ratios = profile.ratios();
    let spent = ledger.spent();

    let remaining_budget = to_signed(ceiling) - to_signed(spent);

    let future_categories: Vec<ComponentCategory> = ledger
        .remaining_categories()
        .into_iter()
        .filter(|c| *c != category)
        .collect();

    let reserved_for_future = future_categories
        .iter()
        .map(|c| to_signed(ratios.fair_share(ceiling, *c)))
        .fold(0i64, i64::saturating_add);

    let available_for_current = remaining_budget.saturating_sub(reserved_for_future);
    let ideal_allocation = to_signed(ratios.fair_share(ceiling, category));

    let blended = if available_for_current > ideal_allocation {
        // never more than the surplus itself, so the sum stays below `available_for_current`
        let surplus = i128::from(available_for_current) - i128::from(ideal_allocation);
        let granted = i64::try_from(surplus * i128::from(SURPLUS_SHARE_PERCENT) / 100).unwrap_or(0);
        ideal_allocation + granted
    } else {
        available_for_current
    };

    let target = u64::try_from(blended).unwrap_or(0).max(MIN_TARGET);
    let band = PriceBand::around(target);

    tracing::debug!(
        category = %category,
        remaining_budget,
        reserved_for_future,
        available_for_current,
        ideal_allocation,
        target,
        band_min = band.min,
        band_max = band.max,
        "Computed price band"
    );

    Allocation {
        category,
        ceiling,
        spent,
        remaining_budget,
        future_categories,
        reserved_for_future,
        available_for_current,
        ideal_allocation,
        target,
        band,
    }
}
