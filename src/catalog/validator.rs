//! Candidate validation, repair and fallback synthesis.
//!
//! Source offers are repaired into `PartCandidate`s; when the source fails or
//! returns nothing usable, three deterministic offers are synthesized around
//! the allocation target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PartCandidate, Recommendation, SourceError};
use crate::budget::{Allocation, ComponentCategory, PriceBand};

pub const DEFAULT_SEARCH_URL: &str = "https://www.amazon.in/s";

/// Offers priced above this multiple of the build ceiling are unusable.
pub const MAX_PRICE_MULTIPLE: u64 = 2;

/// Highest price `repair` accepts for a build with `ceiling`.
///
/// Never above `i64::MAX`, so accepted prices stay representable in the
/// signed budget arithmetic.
pub fn price_cap(ceiling: u64) -> u64 {
    ceiling
        .saturating_mul(MAX_PRICE_MULTIPLE)
        .min(i64::MAX as u64)
}

/// What to do with source offers priced outside the band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandPolicy {
    /// Keep them. The band only steers the source.
    #[default]
    Advisory,
    /// Drop them; fall back if nothing in-band remains.
    Strict,
}

/// Builds outbound product search links from a part name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
    affiliate_tag: Option<String>,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>, affiliate_tag: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            affiliate_tag: affiliate_tag.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn link(&self, name: &str) -> String {
        let mut url = format!("{}?k={}", self.base_url, urlencoding::encode(name.trim()));
        if let Some(tag) = &self.affiliate_tag {
            url.push_str("&tag=");
            url.push_str(&urlencoding::encode(tag));
        }
        url
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_URL, None)
    }
}

/// Why a batch was synthesized instead of coming from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    NotConfigured,
    SourceUnavailable(String),
    MalformedResponse(String),
    /// Strict policy removed every offer.
    NoneInBand,
}

impl From<SourceError> for FallbackReason {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotConfigured => Self::NotConfigured,
            SourceError::Unavailable(msg) => Self::SourceUnavailable(msg),
            SourceError::Malformed(msg) => Self::MalformedResponse(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    Source,
    Fallback(FallbackReason),
}

/// Candidates to show for one category, with the band they were fetched for.
///
/// # Invariants
/// - `candidates` is never empty
/// - candidate ids are unique within the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBatch {
    pub category: ComponentCategory,
    pub band: PriceBand,
    pub target: u64,
    pub candidates: Vec<PartCandidate>,
    pub origin: CandidateOrigin,
}

impl CandidateBatch {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, CandidateOrigin::Fallback(_))
    }

    pub fn get(&self, id: &str) -> Option<&PartCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }
}

/// Read a price from a loose JSON value: numbers, or strings such as "₹12,999".
pub fn parse_price(value: &serde_json::Value) -> Option<f64> {
    let price = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let start = s.find(|c: char| c.is_ascii_digit())?;
            let negative = s[..start].trim_end().ends_with('-');
            let digits: String = s[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
                .filter(|c| *c != ',')
                .collect();
            let amount = digits.parse::<f64>().ok()?;
            if negative {
                -amount
            } else {
                amount
            }
        }
        _ => return None,
    };
    price.is_finite().then_some(price)
}

fn spec_value(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Fallback tiers: label, percent of target, spec blurb.
const FALLBACK_TIERS: [(&str, u64, &str); 3] = [
    ("Value", 90, "Budget Optimized"),
    ("Standard", 100, "Balanced Choice"),
    ("Premium", 110, "Performance Pick"),
];

const FALLBACK_NOTE: &str = "Generic suggestion; confirm compatibility with your selected parts";

/// Turns source output into the list shown to the user.
#[derive(Debug, Clone, Default)]
pub struct CandidateValidator {
    policy: BandPolicy,
    links: LinkBuilder,
}

impl CandidateValidator {
    pub fn new(policy: BandPolicy, links: LinkBuilder) -> Self {
        Self { policy, links }
    }

    /// Repair source offers.
    ///
    /// Offers with a blank name, or a price that is negative or above
    /// `max_price`, are dropped. If none survive, the response counts as
    /// malformed.
    pub fn repair(
        &self,
        category: ComponentCategory,
        offers: Vec<Recommendation>,
        max_price: u64,
    ) -> Result<Vec<PartCandidate>, SourceError> {
        let total = offers.len();
        let mut candidates = Vec::with_capacity(total);

        for (index, offer) in offers.into_iter().enumerate() {
            let name = offer.name.trim();
            if name.is_empty() {
                tracing::debug!(category = %category, index, "Dropping offer without a name");
                continue;
            }
            let Some(price) = parse_price(&offer.price)
                .map(f64::round)
                .filter(|p| *p >= 0.0 && *p <= max_price as f64)
            else {
                tracing::debug!(category = %category, index, price = %offer.price, "Dropping offer with unusable price");
                continue;
            };

            let mut specs: BTreeMap<String, String> = offer
                .specs
                .iter()
                .filter_map(|(k, v)| spec_value(v).map(|v| (k.clone(), v)))
                .collect();
            if specs.is_empty() {
                specs.insert("info".to_string(), "No specifications provided".to_string());
            }

            candidates.push(PartCandidate {
                id: format!("{}-{}", category.slug(), index),
                name: name.to_string(),
                price: (price as u64).min(max_price),
                specs,
                compatibility_note: offer
                    .reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
                source_link: Some(self.links.link(name)),
            });
        }

        if candidates.is_empty() {
            return Err(SourceError::Malformed(format!(
                "none of {} offers had a name and a valid price",
                total
            )));
        }
        Ok(candidates)
    }

    /// Three deterministic offers at 90%, 100% and 110% of `target`.
    pub fn fallback(&self, category: ComponentCategory, target: u64) -> Vec<PartCandidate> {
        FALLBACK_TIERS
            .iter()
            .enumerate()
            .map(|(index, (tier, percent, blurb))| {
                let name = format!("{} {}", tier, category.name());
                PartCandidate::new(
                    format!("fallback-{}-{}", category.slug(), index),
                    name.clone(),
                    target.saturating_mul(*percent) / 100,
                )
                .with_spec("info", *blurb)
                .with_note(FALLBACK_NOTE)
                .with_link(self.links.link(&name))
            })
            .collect()
    }

    /// Produce the batch to show for `allocation` from one source outcome.
    ///
    /// Always returns at least one candidate.
    pub fn resolve(
        &self,
        allocation: &Allocation,
        outcome: Result<Vec<Recommendation>, SourceError>,
    ) -> CandidateBatch {
        let category = allocation.category;
        let max_price = price_cap(allocation.ceiling);
        let repaired = outcome.and_then(|offers| self.repair(category, offers, max_price));

        let origin_and_candidates = match repaired {
            Ok(candidates) => match self.policy {
                BandPolicy::Advisory => Ok(candidates),
                BandPolicy::Strict => {
                    let before = candidates.len();
                    let in_band: Vec<_> = candidates
                        .into_iter()
                        .filter(|c| allocation.band.contains(c.price))
                        .collect();
                    if before != in_band.len() {
                        tracing::info!(
                            category = %category,
                            dropped = before - in_band.len(),
                            "Dropped out-of-band offers"
                        );
                    }
                    if in_band.is_empty() {
                        Err(FallbackReason::NoneInBand)
                    } else {
                        Ok(in_band)
                    }
                }
            },
            Err(e) => Err(FallbackReason::from(e)),
        };

        match origin_and_candidates {
            Ok(candidates) => CandidateBatch {
                category,
                band: allocation.band,
                target: allocation.target,
                candidates,
                origin: CandidateOrigin::Source,
            },
            Err(reason) => {
                tracing::warn!(
                    category = %category,
                    reason = ?reason,
                    target = allocation.target,
                    "Using fallback candidates"
                );
                CandidateBatch {
                    category,
                    band: allocation.band,
                    target: allocation.target,
                    candidates: self.fallback(category, allocation.target),
                    origin: CandidateOrigin::Fallback(reason),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::budget::{allocate, BudgetProfile, BuildLedger, UsageProfile};
    use serde_json::json;

    fn offer(name: &str, price: serde_json::Value) -> Recommendation {
        Recommendation {
            name: name.to_string(),
            price,
            specs: BTreeMap::from([("capacity".to_string(), json!("1TB"))]),
            reason: Some("Fast NVMe".to_string()),
        }
    }

    fn storage_allocation() -> Allocation {
        allocate(
            &BudgetProfile::new(100_000, UsageProfile::Gaming),
            &BuildLedger::new(),
            ComponentCategory::Storage,
        )
    }

    #[test]
    fn test_storage_failure_yields_three_fallbacks() {
        let allocation = storage_allocation();
        assert_eq!(allocation.target, 7_000);

        let batch = CandidateValidator::default().resolve(
            &allocation,
            Err(SourceError::Unavailable("timeout".to_string())),
        );
        let prices: Vec<u64> = batch.candidates.iter().map(|c| c.price).collect();
        assert_eq!(prices, vec![6_300, 7_000, 7_700]);
        assert_eq!(
            batch.origin,
            CandidateOrigin::Fallback(FallbackReason::SourceUnavailable("timeout".to_string()))
        );
        for candidate in &batch.candidates {
            assert!(!candidate.specs.is_empty());
            assert!(candidate.compatibility_note.is_some());
            let link = candidate.source_link.as_deref().unwrap();
            assert!(link.starts_with("https://www.amazon.in/s?k="));
            assert!(!link.contains(' '));
        }
        assert_eq!(batch.candidates[0].name, "Value Storage");
        assert_eq!(batch.candidates[2].name, "Premium Storage");
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let candidates = CandidateValidator::default().fallback(ComponentCategory::Cabinet, 4_000);
        let ids: HashSet<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(candidates[0].id, "fallback-cabinet-0");
    }

    #[test]
    fn test_advisory_keeps_out_of_band_offers() {
        let allocation = storage_allocation();
        let batch = CandidateValidator::default().resolve(
            &allocation,
            Ok(vec![offer("Samsung 990 Pro 2TB", json!(18_999)), offer("Crucial P3 1TB", json!(6_499))]),
        );
        assert_eq!(batch.origin, CandidateOrigin::Source);
        assert_eq!(batch.candidates.len(), 2);
        assert_eq!(batch.candidates[0].id, "storage-0");
        assert_eq!(batch.candidates[0].compatibility_note.as_deref(), Some("Fast NVMe"));
    }

    #[test]
    fn test_strict_drops_out_of_band_offers() {
        let allocation = storage_allocation();
        let validator = CandidateValidator::new(BandPolicy::Strict, LinkBuilder::default());
        let batch = validator.resolve(
            &allocation,
            Ok(vec![offer("Samsung 990 Pro 2TB", json!(18_999)), offer("Crucial P3 1TB", json!(6_499))]),
        );
        assert_eq!(batch.candidates.len(), 1);
        assert_eq!(batch.candidates[0].name, "Crucial P3 1TB");

        let batch = validator.resolve(&allocation, Ok(vec![offer("Samsung 990 Pro 2TB", json!(18_999))]));
        assert_eq!(batch.origin, CandidateOrigin::Fallback(FallbackReason::NoneInBand));
        assert_eq!(batch.candidates.len(), 3);
    }

    #[test]
    fn test_repair_fills_specs_and_drops_bad_offers() {
        let validator = CandidateValidator::default();
        let mut bare = offer("WD Blue SN580", json!("₹5,849"));
        bare.specs.clear();
        bare.reason = Some("   ".to_string());
        let offers = vec![
            bare,
            offer("", json!(5_000)),
            offer("Negative", json!(-10)),
            offer("Nameless price", json!(null)),
        ];
        let candidates = validator.repair(ComponentCategory::Storage, offers, price_cap(100_000)).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 5_849);
        assert_eq!(candidates[0].specs["info"], "No specifications provided");
        assert!(candidates[0].compatibility_note.is_none());
    }

    #[test]
    fn test_repair_of_nothing_usable_is_malformed() {
        let result = CandidateValidator::default().repair(
            ComponentCategory::Memory,
            vec![offer(" ", json!(1))],
            price_cap(100_000),
        );
        assert!(matches!(result, Err(SourceError::Malformed(_))));

        let batch = CandidateValidator::default().resolve(&storage_allocation(), Ok(vec![]));
        assert!(matches!(
            batch.origin,
            CandidateOrigin::Fallback(FallbackReason::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_absurd_prices_are_unusable() {
        let validator = CandidateValidator::default();
        let offers = vec![
            offer("Overflowing SSD", json!(1e19)),
            offer("Astronomical SSD", json!(1e30)),
            offer("Crucial P3 1TB", json!(6_499)),
        ];
        let candidates = validator
            .repair(ComponentCategory::Storage, offers, price_cap(100_000))
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].price, 6_499);
        assert_eq!(candidates[0].id, "storage-2");

        let batch = validator.resolve(
            &storage_allocation(),
            Ok(vec![offer("Overflowing SSD", json!(1e19)), offer("Astronomical SSD", json!(1e30))]),
        );
        assert!(matches!(
            batch.origin,
            CandidateOrigin::Fallback(FallbackReason::MalformedResponse(_))
        ));
        assert!(batch.candidates.iter().all(|c| c.price <= 7_700));
    }

    #[test]
    fn test_price_cap_scales_with_ceiling_and_fits_i64() {
        assert_eq!(price_cap(100_000), 200_000);
        assert_eq!(price_cap(u64::MAX), i64::MAX as u64);

        let validator = CandidateValidator::default();
        let at_cap = validator.repair(ComponentCategory::Memory, vec![offer("Edge", json!(200_000))], 200_000);
        assert_eq!(at_cap.unwrap()[0].price, 200_000);
        let above = validator.repair(ComponentCategory::Memory, vec![offer("Edge", json!(200_001))], 200_000);
        assert!(matches!(above, Err(SourceError::Malformed(_))));
    }

    #[test]
    fn test_spec_values_are_stringified() {
        let mut rec = offer("Kingston Fury 32GB", json!(8_200.4));
        rec.specs = BTreeMap::from([
            ("capacity".to_string(), json!(32)),
            ("speed".to_string(), json!("6000 MT/s")),
            ("rgb".to_string(), json!(null)),
            ("latency".to_string(), json!("")),
        ]);
        let candidates = CandidateValidator::default()
            .repair(ComponentCategory::Memory, vec![rec], price_cap(100_000))
            .unwrap();
        assert_eq!(candidates[0].price, 8_200);
        assert_eq!(candidates[0].specs.len(), 2);
        assert_eq!(candidates[0].specs["capacity"], "32");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(&json!(1299)), Some(1299.0));
        assert_eq!(parse_price(&json!("Rs. 45,000")), Some(45_000.0));
        assert_eq!(parse_price(&json!("₹1,29,999")), Some(129_999.0));
        assert_eq!(parse_price(&json!("-250")), Some(-250.0));
        assert_eq!(parse_price(&json!("call us")), None);
        assert_eq!(parse_price(&json!([1])), None);
    }

    #[test]
    fn test_link_builder_encodes_name_and_tag() {
        let links = LinkBuilder::new(DEFAULT_SEARCH_URL, Some("shop-21".to_string()));
        assert_eq!(
            links.link("RTX 4060 Ti 8GB"),
            "https://www.amazon.in/s?k=RTX%204060%20Ti%208GB&tag=shop-21"
        );
        let plain = LinkBuilder::new("https://example.test/search", Some("  ".to_string()));
        assert_eq!(plain.link("A&B"), "https://example.test/search?k=A%26B");
    }
}
