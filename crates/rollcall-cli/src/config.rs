use rollcall_core::{ExtractorParams, LocatorParams, DEFAULT_ACCEPT_THRESHOLD};

/// Runtime configuration, loaded from `ROLLCALL_*` environment variables
/// with documented defaults. Individual CLI flags override these values.
pub struct Config {
    /// Camera device index (default: 0).
    pub camera_index: usize,
    /// Largest aggregate match distance still accepted (default: 50).
    pub accept_threshold: u32,
    /// Feature extraction tunables.
    pub extractor: ExtractorParams,
    /// Face detector tunables.
    pub locator: LocatorParams,
}

impl Config {
    pub fn from_env() -> Self {
        let extractor = ExtractorParams::default();
        let locator = LocatorParams::default();

        Self {
            camera_index: env_usize("ROLLCALL_CAMERA_INDEX", 0),
            accept_threshold: env_u32("ROLLCALL_ACCEPT_THRESHOLD", DEFAULT_ACCEPT_THRESHOLD),
            extractor: ExtractorParams {
                max_keypoints: env_usize("ROLLCALL_MAX_KEYPOINTS", extractor.max_keypoints),
                levels: env_u8("ROLLCALL_PYRAMID_LEVELS", extractor.levels),
                scale_factor: env_f32("ROLLCALL_PYRAMID_SCALE", extractor.scale_factor),
                fast_threshold: env_u8("ROLLCALL_FAST_THRESHOLD", extractor.fast_threshold),
            },
            locator: LocatorParams {
                min_face_size: env_u32("ROLLCALL_MIN_FACE_SIZE", locator.min_face_size),
                score_threshold: env_f64("ROLLCALL_DETECTOR_SCORE", locator.score_threshold),
                pyramid_scale_factor: env_f32(
                    "ROLLCALL_DETECTOR_PYRAMID_SCALE",
                    locator.pyramid_scale_factor,
                ),
                slide_window_step: env_u32(
                    "ROLLCALL_DETECTOR_WINDOW_STEP",
                    locator.slide_window_step,
                ),
            },
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u8(key: &str, default: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
