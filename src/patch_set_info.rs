use crate::commit_hash::CommitHash;
use crate::patchset::Patchset;

/// A patch set in a `gerrit query` row.
///
/// Only the fields needed to find and fetch a revision are modeled.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatchSetInfo {
    /// Patch set number.
    pub number: Patchset,
    /// Git commit hash.
    pub revision: CommitHash,
    /// Git ref name, like `refs/changes/11/4711/3`.
    #[serde(rename = "ref")]
    pub ref_name: String,
}
