//! Face location via a pretrained SeetaFace-style detector (`rustface`).
//!
//! This is the external detection boundary: given a grayscale frame it
//! returns zero or more rectangular regions, strongest first. Regions may
//! be false positives; downstream matching must tolerate a region whose
//! signature matches nothing.

use image::GrayImage;
use rustface::ImageData;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("detection model not found: {0}")]
    ModelNotFound(String),
    #[error("failed to load detection model {path}: {reason}")]
    ModelLoadFailed { path: String, reason: String },
}

/// Axis-aligned region of a frame likely to contain a face.
///
/// The origin may lie outside the frame (the detector pads its pyramid);
/// use [`Region::clamp_to`] to resolve a crop window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Detector confidence; higher is better.
    pub score: f64,
}

impl Region {
    /// Intersect with a `width` x `height` frame. Returns the in-frame crop
    /// window as (x, y, width, height), or `None` when the intersection is
    /// empty.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = i64::from(self.x).clamp(0, i64::from(width));
        let y0 = i64::from(self.y).clamp(0, i64::from(height));
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Detector tunables, applied once at load time. The detector is
/// deterministic for a fixed frame and fixed tunables.
#[derive(Debug, Clone)]
pub struct LocatorParams {
    /// Smallest face side length considered, in pixels.
    pub min_face_size: u32,
    /// Detector score cutoff below which windows are discarded.
    pub score_threshold: f64,
    /// Detection pyramid scale factor in (0, 1).
    pub pyramid_scale_factor: f32,
    /// Sliding-window step in pixels (both axes).
    pub slide_window_step: u32,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            score_threshold: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: 4,
        }
    }
}

/// Pretrained face detector loaded from a filesystem path.
pub struct FaceLocator {
    detector: Box<dyn rustface::Detector>,
}

impl FaceLocator {
    /// Load the detection model. A missing or unloadable model is a fatal
    /// startup condition for callers.
    pub fn load(model_path: &str, params: &LocatorParams) -> Result<Self, LocatorError> {
        if !Path::new(model_path).exists() {
            return Err(LocatorError::ModelNotFound(model_path.to_string()));
        }

        let mut detector = rustface::create_detector(model_path).map_err(|e| {
            LocatorError::ModelLoadFailed {
                path: model_path.to_string(),
                reason: e.to_string(),
            }
        })?;

        detector.set_min_face_size(params.min_face_size);
        detector.set_score_thresh(params.score_threshold);
        detector.set_pyramid_scale_factor(params.pyramid_scale_factor);
        detector.set_slide_window_step(params.slide_window_step, params.slide_window_step);

        tracing::info!(path = model_path, ?params, "face detection model loaded");

        Ok(Self { detector })
    }

    /// Detect face regions in a grayscale frame, strongest first.
    pub fn locate(&mut self, image: &GrayImage) -> Vec<Region> {
        let mut data = ImageData::new(image.as_raw(), image.width(), image.height());
        let mut regions: Vec<Region> = self
            .detector
            .detect(&mut data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Region {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect();

        regions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: i32, y: i32, w: u32, h: u32) -> Region {
        Region {
            x,
            y,
            width: w,
            height: h,
            score: 1.0,
        }
    }

    #[test]
    fn test_clamp_inside() {
        assert_eq!(region(10, 20, 30, 40).clamp_to(100, 100), Some((10, 20, 30, 40)));
    }

    #[test]
    fn test_clamp_negative_origin() {
        assert_eq!(region(-5, -10, 30, 30).clamp_to(100, 100), Some((0, 0, 25, 20)));
    }

    #[test]
    fn test_clamp_overhanging_edge() {
        assert_eq!(region(90, 95, 30, 30).clamp_to(100, 100), Some((90, 95, 10, 5)));
    }

    #[test]
    fn test_clamp_outside_is_none() {
        assert_eq!(region(200, 200, 30, 30).clamp_to(100, 100), None);
        assert_eq!(region(-50, 0, 30, 30).clamp_to(100, 100), None);
    }

    #[test]
    fn test_clamp_zero_sized_is_none() {
        assert_eq!(region(10, 10, 0, 0).clamp_to(100, 100), None);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let result = FaceLocator::load("/nonexistent/model.bin", &LocatorParams::default());
        assert!(matches!(result, Err(LocatorError::ModelNotFound(_))));
    }
}
