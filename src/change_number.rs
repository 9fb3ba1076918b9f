use std::fmt::Display;
use std::str::FromStr;

use crate::error::CrdError;

/// A Gerrit change number.
///
/// Unlike a change ID, this is a number, and it's only unique on one server.
#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct ChangeNumber(u64);

impl Display for ChangeNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ChangeNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

impl FromStr for ChangeNumber {
    type Err = CrdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u64>() {
            Ok(number) if number > 0 => Ok(Self(number)),
            _ => Err(CrdError::BadRequest(format!(
                "`{s}` is not a change number"
            ))),
        }
    }
}
