//! Build ledger - the parts chosen so far and their running total.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::profile::ComponentCategory;
use crate::catalog::PartCandidate;

/// Selections for one build, at most one part per category.
///
/// # Invariants
/// - `total_spent == sum of selected part prices` (saturating) after every mutation
/// - `version` increases on every mutation
///
/// Serialize only: a ledger is built through [`select`](Self::select), never
/// from an outside record whose total could disagree with its parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildLedger {
    selected: BTreeMap<ComponentCategory, PartCandidate>,
    total_spent: u64,
    version: u64,
}

impl BuildLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `part` into `category`, replacing any earlier choice.
    ///
    /// Returns the part that was replaced, if any. The total moves by the
    /// price delta, computed as a saturating re-sum so absurd prices pin it at
    /// `u64::MAX` instead of overflowing.
    pub fn select(&mut self, category: ComponentCategory, part: PartCandidate) -> Option<PartCandidate> {
        let added = part.price;
        let previous = self.selected.insert(category, part);
        let removed = previous.as_ref().map(|p| p.price).unwrap_or(0);
        self.total_spent = self.saturating_sum();
        self.version += 1;

        tracing::debug!(
            category = %category,
            price = added,
            replaced = removed,
            total_spent = self.total_spent,
            "Ledger updated"
        );

        previous
    }

    /// Consuming form of [`select`](Self::select).
    pub fn with_selection(mut self, category: ComponentCategory, part: PartCandidate) -> Self {
        self.select(category, part);
        self
    }

    fn saturating_sum(&self) -> u64 {
        self.selected
            .values()
            .fold(0u64, |acc, p| acc.saturating_add(p.price))
    }

    /// Categories that still need a part.
    pub fn remaining_categories(&self) -> BTreeSet<ComponentCategory> {
        ComponentCategory::ALL
            .iter()
            .copied()
            .filter(|c| !self.selected.contains_key(c))
            .collect()
    }

    pub fn spent(&self) -> u64 {
        self.total_spent
    }

    pub fn selected(&self, category: ComponentCategory) -> Option<&PartCandidate> {
        self.selected.get(&category)
    }

    /// Selections in wizard order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentCategory, &PartCandidate)> {
        self.selected.iter().map(|(c, p)| (*c, p))
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() == ComponentCategory::ALL.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Drop every selection to start a new build.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.total_spent = 0;
        self.version += 1;
    }
}
