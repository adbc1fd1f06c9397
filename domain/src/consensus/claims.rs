//! Claim normalization and agreement
//!
//! Two responses agree when the share of normalized claims they have in
//! common, measured against the larger claim set, exceeds the match ratio.
//! The default ratio of 0.5 means a strict majority of claims must match.

use std::collections::BTreeSet;

/// Default claim match ratio (strict majority)
pub const DEFAULT_CLAIM_MATCH_RATIO: f64 = 0.5;

/// Canonical form of a claim used for equivalence checks
///
/// Lowercases, collapses internal whitespace and strips trailing
/// sentence punctuation.
pub fn normalize_claim(claim: &str) -> String {
    let collapsed = claim
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(['.', '!', '?', ';', ':', ','])
        .trim_end()
        .to_string()
}

/// Whether two claims are equivalent after normalization
pub fn claims_equivalent(a: &str, b: &str) -> bool {
    normalize_claim(a) == normalize_claim(b)
}

/// A response's normalized, deduplicated claims
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClaimSet(BTreeSet<String>);

impl ClaimSet {
    pub fn from_claims<'a>(claims: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            claims
                .into_iter()
                .map(normalize_claim)
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.0.contains(normalized)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Matching claims over the size of the larger set, in [0, 1]
    pub fn overlap_ratio(&self, other: &ClaimSet) -> f64 {
        let larger = self.len().max(other.len());
        if larger == 0 {
            return 0.0;
        }
        let shared = self.0.intersection(&other.0).count();
        shared as f64 / larger as f64
    }

    pub fn agrees_with(&self, other: &ClaimSet, match_ratio: f64) -> bool {
        self.overlap_ratio(other) > match_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_claim("  Revenue  WAS 1.2M. "), "revenue was 1.2m");
        assert_eq!(normalize_claim("Beds free: 12!"), "beds free: 12");
        assert_eq!(normalize_claim("..."), "");
    }

    #[test]
    fn test_equivalent() {
        assert!(claims_equivalent("Paris is the capital.", "paris is the  capital"));
        assert!(!claims_equivalent("Paris", "Lyon"));
    }

    #[test]
    fn test_identical_sets_agree() {
        let a = ClaimSet::from_claims(["A", "B"]);
        let b = ClaimSet::from_claims(["b.", "a"]);
        assert_eq!(a.overlap_ratio(&b), 1.0);
        assert!(a.agrees_with(&b, DEFAULT_CLAIM_MATCH_RATIO));
    }

    #[test]
    fn test_half_match_is_not_majority() {
        let a = ClaimSet::from_claims(["A", "B"]);
        let b = ClaimSet::from_claims(["A", "C"]);
        assert_eq!(a.overlap_ratio(&b), 0.5);
        assert!(!a.agrees_with(&b, DEFAULT_CLAIM_MATCH_RATIO));
    }

    #[test]
    fn test_superset_with_majority_agrees() {
        let a = ClaimSet::from_claims(["A", "B"]);
        let b = ClaimSet::from_claims(["A", "B", "C"]);
        assert!(a.agrees_with(&b, DEFAULT_CLAIM_MATCH_RATIO));
    }

    #[test]
    fn test_duplicates_collapse() {
        let a = ClaimSet::from_claims(["A", "a.", " A "]);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_empty_sets_never_agree() {
        let a = ClaimSet::default();
        assert_eq!(a.overlap_ratio(&ClaimSet::default()), 0.0);
    }
}
