//! Enrollment roster: one reference signature per identity.
//!
//! Built once at startup from a directory of reference images; the
//! filename stem is the identity key. The roster is read-only for the rest
//! of the run.

use crate::extractor::FeatureExtractor;
use crate::types::Signature;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("cannot read enrollment directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no identities enrolled from {0}")]
    NoIdentities(String),
}

/// One enrolled identity and its reference signature.
///
/// Matching scores (identity, signature) pairs, so an identity gaining
/// additional reference signatures later only changes how many pairs the
/// roster yields, not the matcher contract.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub identity: String,
    pub signature: Signature,
}

/// Ordered store of enrolled reference signatures.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll a signature under an identity. Re-enrolling an existing
    /// identity overwrites its signature but keeps its original position,
    /// so ledger and export order stay stable.
    pub fn enroll(&mut self, identity: impl Into<String>, signature: Signature) {
        let identity = identity.into();
        match self.entries.iter_mut().find(|e| e.identity == identity) {
            Some(entry) => entry.signature = signature,
            None => self.entries.push(RosterEntry {
                identity,
                signature,
            }),
        }
    }

    pub fn lookup(&self, identity: &str) -> Option<&Signature> {
        self.entries
            .iter()
            .find(|e| e.identity == identity)
            .map(|e| &e.signature)
    }

    /// Entries in enrollment order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identity.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a roster from a directory of reference images, one image per
    /// identity, identity = filename stem.
    ///
    /// Directory entries are processed in sorted path order so enrollment
    /// order does not depend on the platform's directory iteration.
    /// Unreadable images are skipped with a warning; a directory yielding
    /// zero usable images is fatal.
    pub fn load_dir(dir: &Path, extractor: &FeatureExtractor) -> Result<Self, RosterError> {
        let entries = std::fs::read_dir(dir).map_err(|source| RosterError::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut roster = Roster::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(path = %path.display(), "skipping reference with unusable filename");
                continue;
            };

            let image = match image::open(&path) {
                Ok(img) => img.to_luma8(),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable reference image"
                    );
                    continue;
                }
            };

            let signature = extractor.extract(&image);
            tracing::debug!(
                identity = stem,
                keypoints = signature.len(),
                "enrolled reference signature"
            );
            roster.enroll(stem, signature);
        }

        if roster.is_empty() {
            return Err(RosterError::NoIdentities(dir.display().to_string()));
        }

        tracing::info!(count = roster.len(), dir = %dir.display(), "roster enrolled");
        Ok(roster)
    }
}
