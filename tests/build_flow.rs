//! End-to-end build sessions driven through the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use pc_architect::catalog::{
    price_cap, BandPolicy, CandidateRequest, CandidateValidator, LinkBuilder, Recommendation, SourceError,
};
use pc_architect::{Architect, BudgetProfile, BuildSession, CandidateSource, ComponentCategory, UsageProfile};

/// Offers one part at the bottom of the band and one 40% above its top.
struct EagerSource;

#[async_trait]
impl CandidateSource for EagerSource {
    fn name(&self) -> &str {
        "eager"
    }

    async fn recommend(&self, request: &CandidateRequest) -> Result<Vec<Recommendation>, SourceError> {
        if request.category == ComponentCategory::PowerSupply {
            return Err(SourceError::Malformed("truncated JSON".to_string()));
        }
        Ok(vec![
            Recommendation {
                name: format!("Sensible {}", request.category),
                price: json!(request.band.min),
                specs: BTreeMap::from([("note".to_string(), json!("in band"))]),
                reason: Some("Within budget".to_string()),
            },
            Recommendation {
                name: format!("Splurge {}", request.category),
                price: json!(request.band.max * 14 / 10),
                specs: BTreeMap::new(),
                reason: None,
            },
        ])
    }
}

/// Mixes absurd prices in with one sensible offer.
struct InflatedSource;

#[async_trait]
impl CandidateSource for InflatedSource {
    fn name(&self) -> &str {
        "inflated"
    }

    async fn recommend(&self, request: &CandidateRequest) -> Result<Vec<Recommendation>, SourceError> {
        let offer = |name: &str, price: serde_json::Value| Recommendation {
            name: format!("{name} {}", request.category),
            price,
            specs: BTreeMap::new(),
            reason: None,
        };
        Ok(vec![
            offer("Gilded", json!(1e19)),
            offer("Mythical", json!(1e30)),
            offer("Sensible", json!(request.band.min)),
        ])
    }
}

async fn complete_build(architect: &Architect, profile: BudgetProfile, pick_most_expensive: bool) -> BuildSession {
    let session = RwLock::new(BuildSession::new(profile));
    loop {
        let next = session.read().await.next_category();
        let Some(category) = next else { break };
        let batch = architect.shop(&session, category).await.unwrap();
        assert!(!batch.candidates.is_empty());
        let pick = if pick_most_expensive {
            batch.candidates.iter().max_by_key(|c| c.price)
        } else {
            batch.candidates.iter().min_by_key(|c| c.price)
        }
        .unwrap()
        .id
        .clone();

        let mut guard = session.write().await;
        let tag = guard.current_request().unwrap();
        guard.choose(&tag, &pick).unwrap();
    }
    session.into_inner()
}

#[tokio::test]
async fn offline_build_of_standard_parts_stays_under_ceiling() {
    let architect = Architect::offline(CandidateValidator::default());
    for usage in UsageProfile::ALL {
        let session = complete_build(&architect, BudgetProfile::new(100_000, usage), false).await;
        let summary = session.summary();
        assert!(session.ledger().is_complete());
        assert!(summary.within_ceiling, "{usage}: {}", summary.total);
        assert_eq!(
            summary.total,
            summary.parts.iter().map(|(_, p)| p.price).sum::<u64>()
        );
    }
}

#[tokio::test]
async fn strict_source_keeps_build_within_ceiling() {
    let architect = Architect::new(
        Some(Arc::new(EagerSource)),
        CandidateValidator::new(BandPolicy::Strict, LinkBuilder::default()),
    );
    let session = complete_build(
        &architect,
        BudgetProfile::from_labels("High End (₹1.5L - ₹2.5L)", "Gaming"),
        true,
    )
    .await;

    let summary = session.summary();
    assert_eq!(summary.ceiling, 250_000);
    assert!(summary.missing.is_empty());
    assert!(summary.within_ceiling, "total {}", summary.total);
    assert!(summary.parts.iter().all(|(_, p)| !p.name.starts_with("Splurge")));

    let (_, psu) = summary
        .parts
        .iter()
        .find(|(c, _)| *c == ComponentCategory::PowerSupply)
        .unwrap();
    assert!(psu.id.starts_with("fallback-"));
}

#[tokio::test]
async fn advisory_source_passes_splurges_through() {
    let architect = Architect::new(Some(Arc::new(EagerSource)), CandidateValidator::default());
    let profile = BudgetProfile::new(100_000, UsageProfile::Gaming);
    let batch = architect
        .get_candidates(&profile, &pc_architect::BuildLedger::new(), ComponentCategory::GraphicsCard)
        .await;
    assert_eq!(batch.candidates.len(), 2);
    assert!(batch.candidates.iter().any(|c| !batch.band.contains(c.price)));
}

#[tokio::test]
async fn absurd_source_prices_never_reach_the_ledger() {
    let architect = Architect::new(Some(Arc::new(InflatedSource)), CandidateValidator::default());
    let profile = BudgetProfile::new(100_000, UsageProfile::Gaming);
    let session = complete_build(&architect, profile, true).await;

    let summary = session.summary();
    assert!(session.ledger().is_complete());
    assert!(summary.parts.iter().all(|(_, p)| p.name.starts_with("Sensible")));
    assert!(summary.parts.iter().all(|(_, p)| p.price <= price_cap(100_000)));
    assert_eq!(summary.total, summary.parts.iter().map(|(_, p)| p.price).sum::<u64>());
    assert!(summary.within_ceiling, "total {}", summary.total);
}
