//! The services a CRD report is computed against.
//!
//! [`Gerrit`](crate::gerrit::Gerrit) implements both traits for real use; tests use an
//! in-memory fake.

use std::collections::BTreeSet;

use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::error::CrdError;

/// Looks up the full commit message for a revision.
pub trait CommitMessageSource: Sync {
    /// Get the message of `revision` in `project`.
    fn fetch_revision(&self, project: &str, revision: &CommitHash) -> Result<String, CrdError>;

    /// Get the message of the current revision of a change.
    fn fetch_change(&self, change: &ChangeSummary) -> Result<String, CrdError> {
        match &change.commit_message {
            Some(message) => Ok(message.clone()),
            None => {
                let patch_set = change.require_current_patch_set()?;
                self.fetch_revision(&change.project, &patch_set.revision)
            }
        }
    }
}

/// Finds changes on the server.
pub trait ChangeResolver: Sync {
    /// Find every change whose change ID is any of `change_ids`, in one request.
    ///
    /// A change ID may match several changes (cherry-picks to other branches) or none.
    fn find_by_change_ids(
        &self,
        change_ids: &BTreeSet<ChangeId>,
    ) -> Result<Vec<ChangeSummary>, CrdError>;

    /// Find changes whose commit message mentions `text`, other than `excluding` itself.
    ///
    /// Each change appears at most once.
    fn search_messages(
        &self,
        text: &str,
        excluding: &ChangeId,
    ) -> Result<Vec<ChangeSummary>, CrdError>;
}
