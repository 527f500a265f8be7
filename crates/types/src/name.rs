//! Name validation and normalization.
//!
//! A canonical name is a lowercase label followed by the fixed [`NAME_SUFFIX`]:
//!
//! - label alphabet is `a-z`, `0-9` and `-`
//! - no leading or trailing `-`, no `--`
//! - label length within [`MIN_LABEL_LEN`, `MAX_LABEL_LEN`]
//!
//! Uppercase input is rejected, not folded.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Suffix every canonical name carries.
pub const NAME_SUFFIX: &str = ".ntu";

/// Minimum label length (characters before the suffix).
pub const MIN_LABEL_LEN: usize = 3;

/// Maximum label length.
pub const MAX_LABEL_LEN: usize = 63;

/// Reasons a raw name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Name is empty")]
    Empty,

    #[error("Label length {0} outside {MIN_LABEL_LEN}..={MAX_LABEL_LEN}")]
    BadLength(usize),

    #[error("Invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("Label cannot start or end with '-'")]
    EdgeHyphen,

    #[error("Label cannot contain '--'")]
    DoubleHyphen,
}

/// A validated, normalized name such as `north.ntu`.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalName(String);

impl CanonicalName {
    /// Full canonical form, suffix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label without the suffix.
    pub fn label(&self) -> &str {
        &self.0[..self.0.len() - NAME_SUFFIX.len()]
    }

    /// Identifier derived from this name.
    pub fn id(&self) -> crate::NameId {
        crate::name_id(self)
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CanonicalName {
    type Error = NameError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        normalize(&raw)
    }
}

impl From<CanonicalName> for String {
    fn from(name: CanonicalName) -> Self {
        name.0
    }
}

/// Turn user input into a [`CanonicalName`].
///
/// Surrounding whitespace is trimmed and a missing suffix is appended, so
/// `"north"`, `" north.ntu "` and `"north.ntu"` all produce `north.ntu`.
pub fn normalize(raw: &str) -> Result<CanonicalName, NameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }

    let label = trimmed.strip_suffix(NAME_SUFFIX).unwrap_or(trimmed);
    validate_label(label)?;

    Ok(CanonicalName(format!("{label}{NAME_SUFFIX}")))
}

fn validate_label(label: &str) -> Result<(), NameError> {
    if label.is_empty() {
        return Err(NameError::Empty);
    }

    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NameError::InvalidCharacter(c));
    }

    // ASCII only past this point, so byte length == char count.
    if label.len() < MIN_LABEL_LEN || label.len() > MAX_LABEL_LEN {
        return Err(NameError::BadLength(label.len()));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(NameError::EdgeHyphen);
    }

    if label.contains("--") {
        return Err(NameError::DoubleHyphen);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_valid_names() {
        for raw in ["alice", "alice-123", "a1b2c3", "abc.ntu", "  north  "] {
            assert!(normalize(raw).is_ok(), "{raw} should be accepted");
        }
        assert_eq!(normalize("alice").unwrap().as_str(), "alice.ntu");
        assert_eq!(normalize("alice.ntu").unwrap().label(), "alice");
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert_eq!(normalize("-abc"), Err(NameError::EdgeHyphen));
        assert_eq!(normalize("abc-"), Err(NameError::EdgeHyphen));
        assert_eq!(normalize("ab--cd"), Err(NameError::DoubleHyphen));
        assert_eq!(normalize("AlicE"), Err(NameError::InvalidCharacter('A')));
        assert_eq!(normalize("ab"), Err(NameError::BadLength(2)));
        assert_eq!(normalize("ab@cd"), Err(NameError::InvalidCharacter('@')));
        assert_eq!(normalize(""), Err(NameError::Empty));
        assert_eq!(normalize(".ntu"), Err(NameError::Empty));
        assert!(normalize("ABC-name").is_err());
        assert!(normalize("north.eth").is_err());
        assert!(normalize(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_try_from_string_normalizes() {
        let name = CanonicalName::try_from("north".to_string()).unwrap();
        assert_eq!(name.as_str(), "north.ntu");
        assert!(CanonicalName::try_from("Bad".to_string()).is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[a-z0-9-]{0,70}(\\.ntu)?") {
            if let Ok(first) = normalize(&raw) {
                let second = normalize(first.as_str()).unwrap();
                prop_assert_eq!(first, second);
            }
        }

        #[test]
        fn prop_canonical_names_are_lowercase(raw in "\\PC{0,40}") {
            if let Ok(name) = normalize(&raw) {
                prop_assert!(name.as_str().ends_with(NAME_SUFFIX));
                prop_assert!(!name.as_str().chars().any(|c| c.is_ascii_uppercase()));
            }
        }
    }
}
