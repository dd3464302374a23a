//! Identity assignment by aggregate descriptor distance.
//!
//! Brute-force scan over the enrolled roster: every query descriptor is
//! paired with its nearest candidate descriptor, pairs are kept only when
//! the nearest-neighbor relation is mutual (cross-check), and the summed
//! Hamming distance of the surviving pairs is the candidate's score.

use crate::roster::Roster;
use crate::types::{Descriptor, Feature, MatchResult, Signature};

/// Default acceptance threshold on the aggregate distance.
pub const DEFAULT_ACCEPT_THRESHOLD: u32 = 50;

/// Strategy for assigning an enrolled identity to a query signature.
pub trait Matcher {
    fn assign(&self, query: &Signature, roster: &Roster) -> MatchResult;
}

/// Mutual best-match Hamming matcher.
pub struct HammingMatcher {
    accept_threshold: u32,
}

impl HammingMatcher {
    /// `accept_threshold` is the largest aggregate distance still accepted
    /// as a match.
    pub fn new(accept_threshold: u32) -> Self {
        Self { accept_threshold }
    }

    pub fn accept_threshold(&self) -> u32 {
        self.accept_threshold
    }

    /// Aggregate distance between a query and one candidate signature, or
    /// `None` when the pairing is empty (either side empty, or no mutual
    /// pairs). An empty pairing must never score as a perfect 0.
    fn aggregate(query: &Signature, candidate: &Signature) -> Option<u32> {
        let q = query.features();
        let c = candidate.features();
        if q.is_empty() || c.is_empty() {
            return None;
        }

        let mut total = 0u32;
        let mut pairs = 0usize;
        for (qi, feature) in q.iter().enumerate() {
            let ci = nearest(&feature.descriptor, c);
            // Cross-check: keep the pair only if the candidate descriptor's
            // nearest query descriptor is this one.
            if nearest(&c[ci].descriptor, q) == qi {
                total += feature.descriptor.hamming(&c[ci].descriptor);
                pairs += 1;
            }
        }

        (pairs > 0).then_some(total)
    }
}

impl Default for HammingMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPT_THRESHOLD)
    }
}

impl Matcher for HammingMatcher {
    fn assign(&self, query: &Signature, roster: &Roster) -> MatchResult {
        if query.is_empty() {
            return MatchResult::none();
        }

        let mut best: Option<(u32, &str)> = None;
        for entry in roster.entries() {
            let Some(score) = Self::aggregate(query, &entry.signature) else {
                continue;
            };
            // Strict `<` keeps the earliest enrolled candidate on ties.
            let better = match best {
                None => true,
                Some((incumbent, _)) => score < incumbent,
            };
            if better {
                best = Some((score, entry.identity.as_str()));
            }
        }

        match best {
            Some((distance, identity)) if distance <= self.accept_threshold => MatchResult {
                matched: true,
                identity: Some(identity.to_string()),
                distance,
            },
            Some((distance, _)) => MatchResult {
                matched: false,
                identity: None,
                distance,
            },
            None => MatchResult::none(),
        }
    }
}

/// Index of the nearest descriptor in `features` (first minimum wins).
/// Callers guarantee `features` is non-empty.
fn nearest(descriptor: &Descriptor, features: &[Feature]) -> usize {
    let mut best_idx = 0usize;
    let mut best_dist = u32::MAX;
    for (i, feature) in features.iter().enumerate() {
        let dist = descriptor.hamming(&feature.descriptor);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Keypoint, DESCRIPTOR_BYTES};

    fn descriptor_with_bits(bits: &[usize]) -> Descriptor {
        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        for &bit in bits {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
        Descriptor(bytes)
    }

    fn feature(descriptor: Descriptor) -> Feature {
        Feature {
            keypoint: Keypoint {
                x: 0.0,
                y: 0.0,
                level: 0,
                score: 1.0,
            },
            descriptor,
        }
    }

    fn signature(descriptors: &[Descriptor]) -> Signature {
        Signature::new(descriptors.iter().copied().map(feature).collect())
    }

    #[test]
    fn test_empty_query_never_matches() {
        let mut roster = Roster::new();
        roster.enroll("A001", signature(&[descriptor_with_bits(&[])]));

        let result = HammingMatcher::default().assign(&Signature::default(), &roster);
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn test_empty_roster_never_matches() {
        let query = signature(&[descriptor_with_bits(&[1, 2])]);
        let result = HammingMatcher::default().assign(&query, &Roster::new());
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn test_identical_signature_matches_at_zero() {
        let sig = signature(&[
            descriptor_with_bits(&[0, 9]),
            descriptor_with_bits(&[100, 200]),
        ]);
        let mut roster = Roster::new();
        roster.enroll("A001", sig.clone());

        let result = HammingMatcher::default().assign(&sig, &roster);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("A001"));
        assert_eq!(result.distance, 0);
    }

    #[test]
    fn test_threshold_boundary() {
        // Single-descriptor signatures differing in exactly 50 / 51 bits.
        let query = signature(&[descriptor_with_bits(&[])]);
        let at: Vec<usize> = (0..50).collect();
        let above: Vec<usize> = (0..51).collect();

        let mut roster = Roster::new();
        roster.enroll("edge", signature(&[descriptor_with_bits(&at)]));
        let result = HammingMatcher::default().assign(&query, &roster);
        assert!(result.matched, "aggregate equal to threshold is accepted");
        assert_eq!(result.distance, 50);

        let mut roster = Roster::new();
        roster.enroll("edge", signature(&[descriptor_with_bits(&above)]));
        let result = HammingMatcher::default().assign(&query, &roster);
        assert!(!result.matched, "aggregate above threshold is rejected");
        assert!(result.identity.is_none());
        assert_eq!(result.distance, 51);
    }

    #[test]
    fn test_tie_break_prefers_first_enrolled() {
        let sig = signature(&[descriptor_with_bits(&[4, 8])]);
        let mut roster = Roster::new();
        roster.enroll("first", sig.clone());
        roster.enroll("second", sig.clone());

        let result = HammingMatcher::default().assign(&sig, &roster);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("first"));
    }

    #[test]
    fn test_best_candidate_wins() {
        let query = signature(&[descriptor_with_bits(&[0, 1])]);
        let mut roster = Roster::new();
        roster.enroll("far", signature(&[descriptor_with_bits(&[0, 1, 2, 3, 4])]));
        roster.enroll("near", signature(&[descriptor_with_bits(&[0, 1, 2])]));

        let result = HammingMatcher::default().assign(&query, &roster);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("near"));
        assert_eq!(result.distance, 1);
    }

    #[test]
    fn test_cross_check_suppresses_double_counting() {
        // Both query descriptors are nearest to the single candidate
        // descriptor; only the mutual pair (q0, c0) may contribute.
        let q0 = descriptor_with_bits(&[]);
        let q1 = descriptor_with_bits(&[7]);
        let query = signature(&[q0, q1]);

        let mut roster = Roster::new();
        roster.enroll("A001", signature(&[descriptor_with_bits(&[])]));

        let result = HammingMatcher::default().assign(&query, &roster);
        assert!(result.matched);
        assert_eq!(result.distance, 0, "one-directional pair must not add its distance");
    }

    #[test]
    fn test_empty_candidate_signature_is_unmatchable() {
        let query = signature(&[descriptor_with_bits(&[1])]);
        let mut roster = Roster::new();
        roster.enroll("blank", Signature::default());
        roster.enroll("real", signature(&[descriptor_with_bits(&[1])]));

        let result = HammingMatcher::default().assign(&query, &roster);
        assert!(result.matched);
        assert_eq!(result.identity.as_deref(), Some("real"));

        let mut only_blank = Roster::new();
        only_blank.enroll("blank", Signature::default());
        let result = HammingMatcher::default().assign(&query, &only_blank);
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn test_custom_threshold() {
        let query = signature(&[descriptor_with_bits(&[])]);
        let mut roster = Roster::new();
        roster.enroll("A001", signature(&[descriptor_with_bits(&[0, 1, 2])]));

        assert!(!HammingMatcher::new(2).assign(&query, &roster).matched);
        assert!(HammingMatcher::new(3).assign(&query, &roster).matched);
    }
}
