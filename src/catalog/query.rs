//! Filtering and ordering of a candidate list for display.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::PartCandidate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortOrder {
    /// Parse "asc", "desc", "name" (or the kebab-case names).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "asc" | "price-asc" | "price" => Some(Self::PriceAsc),
            "desc" | "price-desc" => Some(Self::PriceDesc),
            "name" => Some(Self::Name),
            _ => None,
        }
    }

    fn compare(&self, a: &PartCandidate, b: &PartCandidate) -> Ordering {
        match self {
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}

/// A name filter plus a sort order. Never mutates the list it is applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateQuery {
    pub filter: String,
    pub sort: SortOrder,
}

impl CandidateQuery {
    pub fn new(filter: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            filter: filter.into(),
            sort,
        }
    }

    pub fn matches(&self, candidate: &PartCandidate) -> bool {
        let needle = self.filter.trim().to_lowercase();
        needle.is_empty() || candidate.name.to_lowercase().contains(&needle)
    }

    pub fn apply<'a>(&self, candidates: &'a [PartCandidate]) -> Vec<&'a PartCandidate> {
        let mut shown: Vec<&PartCandidate> = candidates.iter().filter(|c| self.matches(c)).collect();
        // stable, so equal keys keep source order
        shown.sort_by(|a, b| self.sort.compare(a, b));
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<PartCandidate> {
        vec![
            PartCandidate::new("a", "Corsair RM750e", 9_200),
            PartCandidate::new("b", "Antec NE650", 6_400),
            PartCandidate::new("c", "corsair CX650", 6_400),
        ]
    }

    fn ids(shown: &[&PartCandidate]) -> Vec<String> {
        shown.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_default_sorts_by_price_ascending() {
        let parts = list();
        let shown = CandidateQuery::default().apply(&parts);
        assert_eq!(ids(&shown), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let parts = list();
        let shown = CandidateQuery::new("CORSAIR", SortOrder::PriceDesc).apply(&parts);
        assert_eq!(ids(&shown), vec!["a", "c"]);
    }

    #[test]
    fn test_sort_by_name() {
        let parts = list();
        let shown = CandidateQuery::new("", SortOrder::Name).apply(&parts);
        assert_eq!(ids(&shown), vec!["b", "c", "a"]);
        assert_eq!(parts[0].id, "a");
    }

    #[test]
    fn test_no_match_is_empty() {
        let parts = list();
        assert!(CandidateQuery::new("seasonic", SortOrder::PriceAsc).apply(&parts).is_empty());
    }

    #[test]
    fn test_parse_sort_order() {
        assert_eq!(SortOrder::parse("DESC"), Some(SortOrder::PriceDesc));
        assert_eq!(SortOrder::parse("price-asc"), Some(SortOrder::PriceAsc));
        assert_eq!(SortOrder::parse("random"), None);
    }
}
