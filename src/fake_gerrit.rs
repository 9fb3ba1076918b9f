//! An in-memory stand-in for Gerrit, for tests.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::change_number::ChangeNumber;
use crate::change_status::ChangeStatus;
use crate::commit_hash::CommitHash;
use crate::error::CrdError;
use crate::patch_set_info::PatchSetInfo;
use crate::patchset::Patchset;
use crate::resolver::ChangeResolver;
use crate::resolver::CommitMessageSource;

pub const PROJECT: &str = "projectFoo";

/// A change ID ending in `10000 + ending`.
pub fn change_id(ending: u64) -> ChangeId {
    ChangeId::new_unchecked(format!(
        "I0123456789abcdef0000000000000000000{}",
        10000 + ending
    ))
}

pub fn commit_hash(number: u64) -> CommitHash {
    format!("{number:040x}").parse().expect("Hash is well-formed")
}

/// A change numbered `number` with the change ID from [`change_id`].
///
/// The commit message is only reachable through [`CommitMessageSource::fetch_revision`].
pub fn change(number: u64) -> ChangeSummary {
    ChangeSummary {
        id: change_id(number),
        number: ChangeNumber::from(number),
        project: PROJECT.to_owned(),
        branch: "master".to_owned(),
        subject: Some(format!("Change {number}")),
        status: ChangeStatus::New,
        url: None,
        last_updated: None,
        commit_message: None,
        current_patch_set: Some(PatchSetInfo {
            number: Patchset::from(1),
            revision: commit_hash(number),
            ref_name: format!("refs/changes/{:02}/{number}/1", number % 100),
        }),
        patch_sets: Vec::new(),
    }
}

#[derive(Default)]
pub struct FakeGerrit {
    /// Known changes, in the order lookups and searches return them.
    changes: Vec<ChangeSummary>,
    /// Commit messages by project and revision.
    messages: BTreeMap<(String, CommitHash), String>,
    /// Revisions whose messages are searchable but can't be fetched.
    unreadable: BTreeSet<CommitHash>,
    /// Returned (once) by the next lookup.
    pub lookup_error: Mutex<Option<CrdError>>,
    /// Returned (once) by the next search.
    pub search_error: Mutex<Option<CrdError>>,
    /// The arguments of every lookup.
    pub lookups: Mutex<Vec<BTreeSet<ChangeId>>>,
    /// The arguments of every search.
    pub searches: Mutex<Vec<(String, ChangeId)>>,
    /// Every revision whose message was fetched.
    pub fetched: Mutex<Vec<CommitHash>>,
}

impl FakeGerrit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change whose current revision has the given commit message.
    pub fn with_change(mut self, change: ChangeSummary, message: &str) -> Self {
        let revision = change
            .current_patch_set
            .as_ref()
            .expect("Fake changes have a current patch set")
            .revision
            .clone();
        self.messages
            .insert((change.project.clone(), revision), message.to_owned());
        self.changes.push(change);
        self
    }

    /// Add a commit which isn't the current revision of any known change.
    pub fn with_commit(mut self, revision: CommitHash, message: &str) -> Self {
        self.messages
            .insert((PROJECT.to_owned(), revision), message.to_owned());
        self
    }

    /// Make fetching the message of a revision fail, while leaving it searchable.
    pub fn with_unreadable(mut self, revision: CommitHash) -> Self {
        self.unreadable.insert(revision);
        self
    }
}

impl CommitMessageSource for FakeGerrit {
    fn fetch_revision(&self, project: &str, revision: &CommitHash) -> Result<String, CrdError> {
        self.fetched.lock().push(revision.clone());
        if self.unreadable.contains(revision) {
            return Err(CrdError::transport(format!(
                "Connection reset fetching {revision}"
            )));
        }
        self.messages
            .get(&(project.to_owned(), revision.clone()))
            .cloned()
            .ok_or_else(|| CrdError::NotFound(format!("{project} commit {revision}")))
    }
}

impl ChangeResolver for FakeGerrit {
    fn find_by_change_ids(
        &self,
        change_ids: &BTreeSet<ChangeId>,
    ) -> Result<Vec<ChangeSummary>, CrdError> {
        self.lookups.lock().push(change_ids.clone());
        if let Some(error) = self.lookup_error.lock().take() {
            return Err(error);
        }
        Ok(self
            .changes
            .iter()
            .filter(|change| change_ids.contains(&change.id))
            .cloned()
            .collect())
    }

    fn search_messages(
        &self,
        text: &str,
        excluding: &ChangeId,
    ) -> Result<Vec<ChangeSummary>, CrdError> {
        self.searches
            .lock()
            .push((text.to_owned(), excluding.clone()));
        if let Some(error) = self.search_error.lock().take() {
            return Err(error);
        }
        Ok(self
            .changes
            .iter()
            .filter(|change| &change.id != excluding)
            .filter(|change| {
                change
                    .current_patch_set
                    .as_ref()
                    .and_then(|patch_set| {
                        self.messages
                            .get(&(change.project.clone(), patch_set.revision.clone()))
                    })
                    .map(|message| message.contains(text))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
