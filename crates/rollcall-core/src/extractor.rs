//! Local-feature signature extraction.
//!
//! FAST-9 corners detected over a scale pyramid, described with a fixed
//! 256-bit BRIEF-style binary descriptor sampled from a blurred copy of
//! each level. Extraction is fully deterministic: the sampling pattern is
//! generated once from a fixed seed.

use crate::types::{Descriptor, Feature, Keypoint, Signature, DESCRIPTOR_BITS, DESCRIPTOR_BYTES};
use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-width of the descriptor sampling patch. Keypoints closer than this
/// to a level border are discarded so sampling never leaves the image.
const PATCH_RADIUS: u32 = 16;
/// Sampling offsets stay within [-15, 15] of the keypoint.
const SAMPLE_SPREAD: i32 = 15;
/// Blur applied to each level before descriptor sampling, so single-pixel
/// noise does not flip descriptor bits.
const BLUR_SIGMA: f32 = 2.0;
const PATTERN_SEED: u64 = 42;

/// 256 point pairs `[dx1, dy1, dx2, dy2]` drawn once from a seeded RNG.
/// The same pattern must be used for every image or descriptors are not
/// comparable across images.
static SAMPLING_PATTERN: Lazy<[[i32; 4]; DESCRIPTOR_BITS]> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut pattern = [[0i32; 4]; DESCRIPTOR_BITS];
    for pair in pattern.iter_mut() {
        for offset in pair.iter_mut() {
            *offset = rng.gen_range(-SAMPLE_SPREAD..=SAMPLE_SPREAD);
        }
    }
    pattern
});

/// Extraction parameters. Defaults follow the stock configuration of the
/// classical ORB-style detector this pipeline replaces.
#[derive(Debug, Clone)]
pub struct ExtractorParams {
    /// Upper bound on keypoints kept per image, strongest first.
    pub max_keypoints: usize,
    /// Number of pyramid levels; levels smaller than the sampling patch
    /// are skipped.
    pub levels: u8,
    /// Downscale factor between consecutive levels.
    pub scale_factor: f32,
    /// FAST-9 intensity threshold.
    pub fast_threshold: u8,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            max_keypoints: 500,
            levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
        }
    }
}

/// Computes a [`Signature`] for a grayscale face image.
pub struct FeatureExtractor {
    params: ExtractorParams,
}

/// A corner candidate before descriptor computation.
struct CornerCandidate {
    level: usize,
    x: u32,
    y: u32,
    score: f32,
}

impl FeatureExtractor {
    pub fn new(params: ExtractorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Extract a signature from a grayscale image of arbitrary size.
    ///
    /// Returns an empty signature when no keypoints are found; callers must
    /// treat that as "unmatchable", not as a failure.
    pub fn extract(&self, image: &GrayImage) -> Signature {
        // (scale, blurred level image) per usable pyramid level.
        let mut pyramid: Vec<(f32, GrayImage)> = Vec::new();
        let mut candidates: Vec<CornerCandidate> = Vec::new();

        let mut scale = 1.0f32;
        for level in 0..self.params.levels as usize {
            let width = (image.width() as f32 / scale).round() as u32;
            let height = (image.height() as f32 / scale).round() as u32;
            if width < 2 * PATCH_RADIUS + 1 || height < 2 * PATCH_RADIUS + 1 {
                break;
            }

            let resized;
            let level_image: &GrayImage = if level == 0 {
                image
            } else {
                resized = imageops::resize(image, width, height, FilterType::Triangle);
                &resized
            };

            for corner in corners_fast9(level_image, self.params.fast_threshold) {
                let inside = corner.x >= PATCH_RADIUS
                    && corner.y >= PATCH_RADIUS
                    && corner.x < width - PATCH_RADIUS
                    && corner.y < height - PATCH_RADIUS;
                if inside {
                    candidates.push(CornerCandidate {
                        level,
                        x: corner.x,
                        y: corner.y,
                        score: corner.score,
                    });
                }
            }

            pyramid.push((scale, gaussian_blur_f32(level_image, BLUR_SIGMA)));
            scale *= self.params.scale_factor;
        }

        // Keep the strongest corners across all levels. Ties are ordered by
        // (level, y, x) so the result is independent of detection order.
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (a.level, a.y, a.x).cmp(&(b.level, b.y, b.x)))
        });
        candidates.truncate(self.params.max_keypoints);

        let features = candidates
            .iter()
            .map(|c| {
                let (level_scale, blurred) = &pyramid[c.level];
                Feature {
                    keypoint: Keypoint {
                        x: c.x as f32 * level_scale,
                        y: c.y as f32 * level_scale,
                        level: c.level as u8,
                        score: c.score,
                    },
                    descriptor: sample_descriptor(blurred, c.x, c.y),
                }
            })
            .collect();

        Signature::new(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractorParams::default())
    }
}

/// Sample a binary descriptor around (x, y). The keypoint is at least
/// `PATCH_RADIUS` from every border, so all sample offsets stay in bounds.
fn sample_descriptor(blurred: &GrayImage, x: u32, y: u32) -> Descriptor {
    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for (i, byte) in bytes.iter_mut().enumerate() {
        for bit in 0..8 {
            let [dx1, dy1, dx2, dy2] = SAMPLING_PATTERN[i * 8 + bit];
            let a = blurred.get_pixel((x as i32 + dx1) as u32, (y as i32 + dy1) as u32).0[0];
            let b = blurred.get_pixel((x as i32 + dx2) as u32, (y as i32 + dy2) as u32).0[0];
            *byte = (*byte << 1) | u8::from(a > b);
        }
    }
    Descriptor(bytes)
}
