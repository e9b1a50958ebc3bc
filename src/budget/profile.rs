//! Budget profile: spending ceiling, usage profile and ratio tables.
//!
//! # Key Concepts
//! - Tier: a closed set of budget choices, each mapping to one ceiling in rupees
//! - Usage: selects which ratio table splits the ceiling across categories
//! - Ratio table: fixed basis-point shares per category with an explicit default share

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Basis points in one whole (100%).
pub const BASIS_POINTS: u32 = 10_000;

/// Share applied to any category missing from a ratio table (5%).
pub const DEFAULT_SHARE_BP: u32 = 500;

/// Ceiling used when a tier label cannot be recognised.
pub const DEFAULT_CEILING: u64 = 100_000;

/// Errors raised while reading profile labels.
///
/// These never abort a build: the `resolve_*` helpers log them and fall back
/// to the documented defaults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unrecognized budget tier: {0}")]
    UnknownTier(String),

    #[error("Unrecognized usage profile: {0}")]
    UnknownUsage(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// A category of component every complete build must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentCategory {
    #[serde(rename = "Processor")]
    Processor,
    #[serde(rename = "Motherboard")]
    Motherboard,
    #[serde(rename = "Memory")]
    Memory,
    #[serde(rename = "Graphics Card")]
    GraphicsCard,
    #[serde(rename = "Storage")]
    Storage,
    #[serde(rename = "Power Supply")]
    PowerSupply,
    #[serde(rename = "Cabinet")]
    Cabinet,
}

impl ComponentCategory {
    /// Every category, in the order the wizard shops for them.
    pub const ALL: [ComponentCategory; 7] = [
        Self::Processor,
        Self::Motherboard,
        Self::Memory,
        Self::GraphicsCard,
        Self::Storage,
        Self::PowerSupply,
        Self::Cabinet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Processor => "Processor",
            Self::Motherboard => "Motherboard",
            Self::Memory => "Memory",
            Self::GraphicsCard => "Graphics Card",
            Self::Storage => "Storage",
            Self::PowerSupply => "Power Supply",
            Self::Cabinet => "Cabinet",
        }
    }

    /// Short title shown on the wizard step.
    pub fn title(&self) -> &'static str {
        match self {
            Self::GraphicsCard => "Graphics",
            Self::PowerSupply => "Power",
            other => other.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Processor => "The brain of your PC",
            Self::Motherboard => "Connects everything",
            Self::Memory => "Multitasking power",
            Self::GraphicsCard => "Gaming & Rendering",
            Self::Storage => "Space for files",
            Self::PowerSupply => "Energy supply",
            Self::Cabinet => "Housing",
        }
    }

    /// Lowercase identifier used in candidate ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Processor => "processor",
            Self::Motherboard => "motherboard",
            Self::Memory => "memory",
            Self::GraphicsCard => "graphics-card",
            Self::Storage => "storage",
            Self::PowerSupply => "power-supply",
            Self::Cabinet => "cabinet",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the finished machine will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageProfile {
    Gaming,
    Workstation,
}

impl UsageProfile {
    pub const ALL: [UsageProfile; 2] = [Self::Gaming, Self::Workstation];

    /// Parse a usage label such as "Gaming & Streaming" or "Workstation".
    pub fn parse(label: &str) -> Result<Self, ConfigError> {
        let lower = label.trim().to_lowercase();
        if lower.contains("workstation") {
            Ok(Self::Workstation)
        } else if lower.contains("gaming") {
            Ok(Self::Gaming)
        } else {
            Err(ConfigError::UnknownUsage(label.to_string()))
        }
    }

    /// Parse a usage label, falling back to `Gaming` when it is unrecognised.
    pub fn resolve(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to Gaming usage profile");
            Self::Gaming
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gaming => "Gaming & Streaming",
            Self::Workstation => "Workstation",
        }
    }

    /// The fixed ratio table for this usage.
    pub fn ratio_table(&self) -> RatioTable {
        use ComponentCategory::*;
        match self {
            Self::Workstation => RatioTable::new(
                [
                    (Processor, 2500),
                    (GraphicsCard, 2000),
                    (Motherboard, 1500),
                    (Memory, 1500),
                    (Storage, 1000),
                    (PowerSupply, 800),
                    (Cabinet, 700),
                ],
                DEFAULT_SHARE_BP,
            ),
            Self::Gaming => RatioTable::new(
                [
                    (Processor, 1800),
                    (GraphicsCard, 3500),
                    (Motherboard, 1200),
                    (Memory, 800),
                    (Storage, 700),
                    (PowerSupply, 1000),
                    (Cabinet, 1000),
                ],
                DEFAULT_SHARE_BP,
            ),
        }
    }
}

impl fmt::Display for UsageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shares of the ceiling per category, in basis points.
///
/// Lookups for categories that are not in the table return `default_share`
/// instead of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioTable {
    shares: BTreeMap<ComponentCategory, u32>,
    default_share: u32,
}

impl RatioTable {
    pub fn new(
        shares: impl IntoIterator<Item = (ComponentCategory, u32)>,
        default_share: u32,
    ) -> Self {
        Self {
            shares: shares.into_iter().collect(),
            default_share,
        }
    }

    /// Share of `category` in basis points.
    pub fn share_bp(&self, category: ComponentCategory) -> u32 {
        self.shares
            .get(&category)
            .copied()
            .unwrap_or(self.default_share)
    }

    /// Share of `category` as a fraction of 1.0.
    pub fn fraction(&self, category: ComponentCategory) -> f64 {
        self.share_bp(category) as f64 / BASIS_POINTS as f64
    }

    /// Whether the table lists `category` explicitly.
    pub fn contains(&self, category: ComponentCategory) -> bool {
        self.shares.contains_key(&category)
    }

    /// Fair share of `ceiling` for `category`, in whole rupees.
    ///
    /// Computed in `u128`; saturates at `u64::MAX` for shares above 100%.
    pub fn fair_share(&self, ceiling: u64, category: ComponentCategory) -> u64 {
        let share = u128::from(ceiling) * u128::from(self.share_bp(category)) / u128::from(BASIS_POINTS);
        u64::try_from(share).unwrap_or(u64::MAX)
    }

    /// Sum of the fractions over every category.
    pub fn total_fraction(&self) -> f64 {
        ComponentCategory::ALL
            .iter()
            .map(|c| self.fraction(*c))
            .sum()
    }
}

/// Budget choices offered on the first wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetTier {
    Entry,
    Medium,
    HighEnd,
    Enthusiast,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 4] = [Self::Entry, Self::Medium, Self::HighEnd, Self::Enthusiast];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "Entry Level (₹30k - ₹50k)",
            Self::Medium => "Medium (₹60k - ₹1L)",
            Self::HighEnd => "High End (₹1.5L - ₹2.5L)",
            Self::Enthusiast => "Enthusiast (₹3L+)",
        }
    }

    pub fn ceiling(&self) -> u64 {
        match self {
            Self::Entry => 50_000,
            Self::Medium => 100_000,
            Self::HighEnd => 250_000,
            Self::Enthusiast => 500_000,
        }
    }

    /// Match a tier by its name or by the ceiling marker in its label.
    pub fn parse(label: &str) -> Result<Self, ConfigError> {
        let lower = label.trim().to_lowercase();
        // Most specific markers first: "1.5l" must not be read as "1l".
        if lower.contains("enthusiast") || lower.contains("3l+") {
            Ok(Self::Enthusiast)
        } else if lower.contains("high") || lower.contains("2.5l") {
            Ok(Self::HighEnd)
        } else if lower.contains("medium") || lower.contains("1l") {
            Ok(Self::Medium)
        } else if lower.contains("entry") || lower.contains("50k") {
            Ok(Self::Entry)
        } else {
            Err(ConfigError::UnknownTier(label.to_string()))
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolve a tier label to a ceiling, failing closed to [`DEFAULT_CEILING`].
pub fn resolve_ceiling(label: &str) -> u64 {
    match BudgetTier::parse(label) {
        Ok(tier) => tier.ceiling(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                default_ceiling = DEFAULT_CEILING,
                "Using default budget ceiling"
            );
            DEFAULT_CEILING
        }
    }
}

/// Ceiling and usage for one build session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetProfile {
    ceiling: u64,
    usage: UsageProfile,
    ratios: RatioTable,
}

impl BudgetProfile {
    pub fn new(ceiling: u64, usage: UsageProfile) -> Self {
        Self {
            ceiling,
            usage,
            ratios: usage.ratio_table(),
        }
    }

    /// Build a profile from the labels picked on the intro step.
    pub fn from_labels(tier_label: &str, usage_label: &str) -> Self {
        Self::new(resolve_ceiling(tier_label), UsageProfile::resolve(usage_label))
    }

    /// Override the ratio table (for extension profiles and tests).
    pub fn with_ratios(mut self, ratios: RatioTable) -> Self {
        self.ratios = ratios;
        self
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn usage(&self) -> UsageProfile {
        self.usage
    }

    pub fn ratios(&self) -> &RatioTable {
        &self.ratios
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_tables_sum_to_one() {
        for usage in UsageProfile::ALL {
            let total = usage.ratio_table().total_fraction();
            assert!((total - 1.0).abs() <= 0.01, "{usage}: {total}");
        }
    }

    #[test]
    fn test_gaming_weights_graphics_most() {
        let table = UsageProfile::Gaming.ratio_table();
        let gpu = table.share_bp(ComponentCategory::GraphicsCard);
        for category in ComponentCategory::ALL {
            if category != ComponentCategory::GraphicsCard {
                assert!(table.share_bp(category) < gpu);
            }
        }
    }

    #[test]
    fn test_workstation_weights_cpu_and_memory() {
        let ws = UsageProfile::Workstation.ratio_table();
        let gaming = UsageProfile::Gaming.ratio_table();
        assert!(ws.share_bp(ComponentCategory::Processor) > gaming.share_bp(ComponentCategory::Processor));
        assert!(ws.share_bp(ComponentCategory::Memory) > gaming.share_bp(ComponentCategory::Memory));
        assert_eq!(ws.share_bp(ComponentCategory::Processor), 2500);
    }

    #[test]
    fn test_missing_category_uses_default_share() {
        let table = RatioTable::new([(ComponentCategory::Processor, 4000)], DEFAULT_SHARE_BP);
        assert!(!table.contains(ComponentCategory::Cabinet));
        assert_eq!(table.share_bp(ComponentCategory::Cabinet), 500);
        assert!((table.fraction(ComponentCategory::Cabinet) - 0.05).abs() < f64::EPSILON);
        assert_eq!(table.fair_share(100_000, ComponentCategory::Cabinet), 5_000);
    }

    #[test]
    fn test_tier_labels_resolve() {
        assert_eq!(resolve_ceiling("Entry Level (₹30k - ₹50k)"), 50_000);
        assert_eq!(resolve_ceiling("Medium (₹60k - ₹1L)"), 100_000);
        assert_eq!(resolve_ceiling("High End (₹1.5L - ₹2.5L)"), 250_000);
        assert_eq!(resolve_ceiling("Enthusiast (₹3L+)"), 500_000);
        assert_eq!(resolve_ceiling("High"), 250_000);
        for tier in BudgetTier::ALL {
            assert_eq!(BudgetTier::parse(tier.label()), Ok(tier));
        }
    }

    #[test]
    fn test_unknown_tier_fails_closed() {
        assert_eq!(resolve_ceiling("Lottery winner"), DEFAULT_CEILING);
        assert!(matches!(
            BudgetTier::parse("Lottery winner"),
            Err(ConfigError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_usage_labels() {
        assert_eq!(UsageProfile::resolve("Gaming & Streaming"), UsageProfile::Gaming);
        assert_eq!(UsageProfile::resolve("3D Workstation"), UsageProfile::Workstation);
        assert_eq!(UsageProfile::resolve("knitting"), UsageProfile::Gaming);
        assert!(UsageProfile::parse("knitting").is_err());
    }

    #[test]
    fn test_profile_from_labels() {
        let profile = BudgetProfile::from_labels("Enthusiast (₹3L+)", "Workstation");
        assert_eq!(profile.ceiling(), 500_000);
        assert_eq!(profile.usage(), UsageProfile::Workstation);
        assert_eq!(profile.ratios(), &UsageProfile::Workstation.ratio_table());
    }
}
