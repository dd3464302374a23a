use serde::{Deserialize, Serialize};

/// Descriptor width in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;
/// Descriptor width in bits.
pub const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// A salient point in full-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Pyramid level the point was detected on (0 = full resolution).
    pub level: u8,
    /// Detector corner score; higher is more salient.
    pub score: f32,
}

/// Fixed-width binary descriptor. Distance metric is Hamming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    /// Hamming distance: number of differing bits, in `0..=256`.
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// One keypoint together with its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// Ordered set of local features extracted from one face image.
///
/// A signature may be empty when the image yields no keypoints (e.g. a
/// uniform crop). An empty signature is unmatchable, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    features: Vec<Feature>,
}

impl Signature {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Result of assigning a query signature to an enrolled identity.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Identity of the accepted candidate; set only when `matched`.
    pub identity: Option<String>,
    /// Aggregate Hamming distance of the best scorable candidate, lower is
    /// better. `u32::MAX` when no candidate could be scored at all.
    pub distance: u32,
}

impl MatchResult {
    /// The "no match" value: empty query, empty roster, or nothing scorable.
    pub fn none() -> Self {
        Self {
            matched: false,
            identity: None,
            distance: u32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor_with_bits(bits: &[usize]) -> Descriptor {
        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        for &bit in bits {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
        Descriptor(bytes)
    }

    #[test]
    fn test_hamming_identical() {
        let d = descriptor_with_bits(&[0, 17, 255]);
        assert_eq!(d.hamming(&d), 0);
    }

    #[test]
    fn test_hamming_counts_differing_bits() {
        let a = descriptor_with_bits(&[0, 1, 2]);
        let b = descriptor_with_bits(&[2, 3]);
        // Differ on bits 0, 1 and 3.
        assert_eq!(a.hamming(&b), 3);
        assert_eq!(b.hamming(&a), 3);
    }

    #[test]
    fn test_hamming_all_bits() {
        let zeros = Descriptor([0u8; DESCRIPTOR_BYTES]);
        let ones = Descriptor([0xFF; DESCRIPTOR_BYTES]);
        assert_eq!(zeros.hamming(&ones), DESCRIPTOR_BITS as u32);
    }

    #[test]
    fn test_empty_signature() {
        let sig = Signature::default();
        assert!(sig.is_empty());
        assert_eq!(sig.len(), 0);
    }

    #[test]
    fn test_match_result_none() {
        let none = MatchResult::none();
        assert!(!none.matched);
        assert!(none.identity.is_none());
        assert_eq!(none.distance, u32::MAX);
    }
}
