use std::fmt::Display;
use std::str::FromStr;

use derive_more::From;
use derive_more::Into;

use crate::change_number::ChangeNumber;
use crate::error::CrdError;

/// A patch set number within a change.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    derive_more::Display,
    Into,
    From,
)]
#[serde(transparent)]
pub struct Patchset(u64);

/// A [`ChangeNumber`] and a [`Patchset`], written `CHANGE/PATCHSET`.
#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct ChangePatchset {
    pub change: ChangeNumber,
    pub patchset: Patchset,
}

impl Display for ChangePatchset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.change, self.patchset)
    }
}

impl FromStr for ChangePatchset {
    type Err = CrdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (change, patchset) = s.split_once('/').ok_or_else(|| {
            CrdError::BadRequest(format!("`{s}` should look like `CHANGE/PATCHSET`"))
        })?;
        let patchset = match patchset.parse::<u64>() {
            Ok(patchset) if patchset > 0 => Patchset(patchset),
            _ => {
                return Err(CrdError::BadRequest(format!(
                    "`{patchset}` is not a patch set number"
                )))
            }
        };
        Ok(Self {
            change: change.parse()?,
            patchset,
        })
    }
}
