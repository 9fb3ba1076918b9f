use std::collections::BTreeSet;

use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::depends_on_extractor::extract_depends_on;
use crate::error::CrdError;
use crate::resolver::ChangeResolver;
use crate::resolver::CommitMessageSource;

/// The changes a revision declares it depends on, split by whether this server knows them.
#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DependsOn {
    /// Known changes matching a declared change ID, in lookup order.
    ///
    /// One change ID may match several changes, e.g. cherry-picks to other branches.
    #[serde(rename = "dependsOnFound")]
    pub found: Vec<ChangeSummary>,
    /// Declared change IDs matching no known change, in declaration order.
    #[serde(rename = "dependsOnMissing")]
    pub missing: Vec<ChangeId>,
}

impl DependsOn {
    /// Resolve the `Depends-On` declarations in the message of `revision` in `project`.
    #[tracing::instrument(level = "debug", skip(source, resolver))]
    pub fn resolve(
        source: &impl CommitMessageSource,
        resolver: &impl ChangeResolver,
        project: &str,
        revision: &CommitHash,
    ) -> Result<Self, CrdError> {
        let commit_message = source.fetch_revision(project, revision)?;
        Self::from_commit_message(resolver, &commit_message)
    }

    /// Resolve the `Depends-On` declarations in a commit message the caller already has.
    pub fn from_commit_message(
        resolver: &impl ChangeResolver,
        commit_message: &str,
    ) -> Result<Self, CrdError> {
        let declared = extract_depends_on(commit_message);
        if declared.is_empty() {
            return Ok(Self::default());
        }

        let distinct = declared.iter().cloned().collect::<BTreeSet<_>>();
        let candidates = resolver.find_by_change_ids(&distinct)?;
        Ok(Self::partition(declared, candidates))
    }

    /// Match lookup results to declared change IDs by value.
    ///
    /// `candidates` may hold several changes per change ID, or none, or changes that weren't
    /// asked for at all (which are dropped).
    pub fn partition(declared: Vec<ChangeId>, candidates: Vec<ChangeSummary>) -> Self {
        let wanted = declared.iter().collect::<BTreeSet<_>>();
        let mut found_ids = BTreeSet::new();
        let mut found = Vec::with_capacity(candidates.len());

        for change in candidates {
            if wanted.contains(&change.id) {
                tracing::debug!(change_id = %change.id, number = %change.number, "Found dependency");
                found_ids.insert(change.id.clone());
                found.push(change);
            }
        }

        let missing = declared
            .into_iter()
            .filter(|change_id| !found_ids.contains(change_id))
            .inspect(|change_id| tracing::debug!(%change_id, "Dependency is missing"))
            .collect();

        Self { found, missing }
    }

    /// Every change ID this revision depends on, found or not.
    pub fn change_ids(&self) -> BTreeSet<&ChangeId> {
        self.found
            .iter()
            .map(|change| &change.id)
            .chain(self.missing.iter())
            .collect()
    }
}
