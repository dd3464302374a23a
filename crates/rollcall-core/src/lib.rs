//! rollcall-core: enrollment-and-matching engine for camera attendance.
//!
//! Classical local-feature pipeline: FAST-9 keypoints with binary
//! BRIEF-style descriptors, matched against an enrolled roster by
//! mutual-best Hamming distance.

pub mod extractor;
pub mod ledger;
pub mod locator;
pub mod matcher;
pub mod roster;
pub mod types;

pub use extractor::{ExtractorParams, FeatureExtractor};
pub use ledger::AttendanceLedger;
pub use locator::{FaceLocator, LocatorParams, Region};
pub use matcher::{HammingMatcher, Matcher, DEFAULT_ACCEPT_THRESHOLD};
pub use roster::{Roster, RosterEntry};
pub use types::{Descriptor, Feature, Keypoint, MatchResult, Signature};
