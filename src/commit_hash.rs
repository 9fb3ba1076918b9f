use std::str::FromStr;

use derive_more::{AsRef, Deref, Display, Into};

use crate::error::CrdError;

/// A full Git commit hash.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Display,
    Into,
    AsRef,
    Deref,
)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    /// Get an abbreviated 8-character Git hash.
    pub fn abbrev(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for CommitHash {
    type Err = CrdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(CrdError::BadRequest(format!(
                "`{s}` is not a full 40-character commit hash"
            )))
        }
    }
}
