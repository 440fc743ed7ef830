//! Hashtag grammar: canonical form and validation

use regex_lite::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// `#` followed by at least one char that is neither whitespace nor in the
/// punctuation blacklist
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^#[^\s!@#$%^&*(),.?":{}|<>]+$"#).expect("hashtag pattern compiles")
});

/// Errors raised while turning raw text into a label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("This is not a hashtag: {0}. Try to use only numbers and letters.")]
    NotAHashtag(String),
}

/// Trim, ensure a leading `#`, lowercase everything
///
/// Idempotent: canonicalizing a canonical label returns it unchanged.
pub fn canonicalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.starts_with('#') {
        lowered
    } else {
        format!("#{lowered}")
    }
}

/// Check a canonicalized candidate against the hashtag grammar
pub fn validate(candidate: &str) -> Result<(), LabelError> {
    if HASHTAG.is_match(candidate) {
        Ok(())
    } else {
        Err(LabelError::NotAHashtag(candidate.to_string()))
    }
}
