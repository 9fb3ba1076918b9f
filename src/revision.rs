use std::str::FromStr;

use crate::change_number::ChangeNumber;
use crate::error::CrdError;
use crate::patchset::ChangePatchset;

/// How a revision to report on is named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionKey {
    /// The current patch set of a change, like `4711`.
    Change(ChangeNumber),
    /// A specific patch set, like `4711/3`.
    Patchset(ChangePatchset),
    /// A commit, either a full hash or anything `git rev-parse` understands.
    Commit(String),
}

impl Default for RevisionKey {
    fn default() -> Self {
        Self::Commit("HEAD".to_owned())
    }
}

impl FromStr for RevisionKey {
    type Err = CrdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(CrdError::BadRequest("Empty revision".to_owned()))
        } else if s.contains('/') && s.starts_with(|c: char| c.is_ascii_digit()) {
            s.parse().map(Self::Patchset)
        } else if s.len() < 40 && s.chars().all(|c| c.is_ascii_digit()) {
            s.parse().map(Self::Change)
        } else {
            Ok(Self::Commit(s.to_owned()))
        }
    }
}
