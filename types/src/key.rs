//! Key normalization for institution and company names.
//!
//! Free-text names typed by users ("  MIT ", "mit", "M I T") are canonicalized
//! into stable bucket keys. Two names belong to the same bucket iff their
//! normalized forms are equal.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonicalize free text into a bucket key.
///
/// Trims, lowercases and collapses every internal whitespace run to a single
/// space. Whitespace-only input yields the empty string, which is never a
/// valid key.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// A normalized, non-empty bucket key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketKey(String);

impl BucketKey {
    /// Normalize `text` into a key, rejecting names that normalize to nothing.
    pub fn new(text: &str) -> Result<Self, TypesError> {
        let key = normalize(text);
        if key.is_empty() {
            return Err(TypesError::EmptyKey(text.to_string()));
        }
        Ok(Self(key))
    }

    /// Like [`BucketKey::new`] but returns `None` for empty keys.
    pub fn from_text(text: &str) -> Option<Self> {
        Self::new(text).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BucketKey {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<BucketKey> for String {
    fn from(key: BucketKey) -> Self {
        key.0
    }
}
