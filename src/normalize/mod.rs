//! Label normalization: raw tag text to canonical, deduplicated labels
//!
//! `normalize` runs three steps in a fixed order:
//!
//! 1. [`canonicalize`]: trim, `#` prefix, lowercase
//! 2. [`validate`]: hashtag grammar, rejecting with [`LabelError`]
//! 3. reconcile: fuzzy-match against existing labels and reuse the best one
//!    if it scores above the threshold
//!
//! Reconciliation sees the canonical form, so matching is case- and
//! prefix-insensitive.

pub mod fuzzy;
mod grammar;

pub use grammar::{canonicalize, validate, LabelError};

use crate::graph::Label;
use tracing::{debug, info};

/// Score (0-100) a match must exceed to be merged
pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 80;

/// Turns raw user text into canonical node labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelNormalizer {
    threshold: u8,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelNormalizer {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Merge only matches scoring strictly above `threshold` (capped at 100)
    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn canonicalize(&self, raw: &str) -> String {
        canonicalize(raw)
    }

    pub fn validate(&self, candidate: &str) -> Result<(), LabelError> {
        validate(candidate)
    }

    /// Canonicalize and validate, without looking at existing labels
    pub fn canonical_label(&self, raw: &str) -> Result<Label, LabelError> {
        let candidate = canonicalize(raw);
        validate(&candidate)?;
        Ok(Label::from(candidate))
    }

    /// Return the existing label that best matches `candidate` if it scores
    /// above the threshold, otherwise `candidate` itself
    pub fn reconcile<S: AsRef<str>>(&self, candidate: &str, existing: &[S]) -> Label {
        let Some(best) = fuzzy::extract_one(candidate, existing.iter().map(|s| s.as_ref())) else {
            return Label::from(candidate);
        };

        debug!(
            candidate,
            best = best.choice,
            score = best.score,
            "closest existing label"
        );
        if best.score > self.threshold {
            if best.choice != candidate {
                info!(
                    candidate,
                    merged_into = best.choice,
                    score = best.score,
                    "merged near-duplicate label"
                );
            }
            Label::from(best.choice)
        } else {
            Label::from(candidate)
        }
    }

    /// Canonicalize, validate, then reconcile against `existing`
    pub fn normalize<S: AsRef<str>>(&self, raw: &str, existing: &[S]) -> Result<Label, LabelError> {
        let candidate = self.canonical_label(raw)?;
        Ok(self.reconcile(candidate.as_str(), existing))
    }
}
