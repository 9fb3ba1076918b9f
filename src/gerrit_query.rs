use std::fmt::Display;

use itertools::Itertools;

use crate::change_id::ChangeId;
use crate::change_number::ChangeNumber;
use crate::commit_hash::CommitHash;

/// Options for performing a `gerrit query`.
///
/// Not modeled: `--deadline`.
#[derive(Default, Debug, Clone)]
pub struct GerritQuery {
    /// The query to execute.
    query: String,
    /// Include the full commit message for a change
    commit_message: bool,
    /// Include information about current patch set
    current_patch_set: bool,
    /// Return all results, overriding the default limit
    no_limit: bool,
    /// Include information about all patch sets
    patch_sets: bool,
}

impl GerritQuery {
    /// Construct query options wrapping the given string.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Changes with any of the given change IDs.
    pub fn any_change_id<'a>(change_ids: impl IntoIterator<Item = &'a ChangeId>) -> Self {
        Self::new(
            change_ids
                .into_iter()
                .map(|change_id| format!("change:{change_id}"))
                .join(" OR "),
        )
    }

    /// Changes other than `excluding` whose commit message mentions `text`.
    pub fn message_mentions(text: &str, excluding: &ChangeId) -> Self {
        Self::new(format!("message:{text} -change:{excluding}"))
    }

    /// A single change, by number.
    pub fn change_number(change: ChangeNumber) -> Self {
        Self::new(format!("change:{change}"))
    }

    /// Changes in `project` with a patch set at `commit`.
    pub fn commit(commit: &CommitHash, project: &str) -> Self {
        Self::new(format!("commit:{commit} project:{project}"))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Convert this query into CLI options, to be appended to `gerrit`.
    pub fn into_args(self) -> Vec<String> {
        let mut args = vec!["query".to_owned(), "--format".to_owned(), "json".to_owned()];

        if self.commit_message {
            args.push("--commit-message".to_owned());
        }
        if self.current_patch_set {
            args.push("--current-patch-set".to_owned());
        }
        if self.no_limit {
            args.push("--no-limit".to_owned());
        }
        if self.patch_sets {
            args.push("--patch-sets".to_owned());
        }

        args.push("--".to_owned());
        args.push(self.query);

        args
    }

    /// Include the full commit message for a change.
    pub fn commit_message(mut self) -> Self {
        self.commit_message = true;
        self
    }

    /// Include information about current patch set.
    pub fn current_patch_set(mut self) -> Self {
        self.current_patch_set = true;
        self
    }

    /// Return all results, overriding the default limit.
    pub fn no_limit(mut self) -> Self {
        self.no_limit = true;
        self
    }

    /// Include information about all patch sets.
    pub fn patch_sets(mut self) -> Self {
        self.patch_sets = true;
        self
    }
}

impl Display for GerritQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.query.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gerrit::change_id;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_any_change_id() {
        let ids = [change_id(1), change_id(2), change_id(3)];
        assert_eq!(
            GerritQuery::any_change_id(&ids).query(),
            format!(
                "change:{} OR change:{} OR change:{}",
                ids[0], ids[1], ids[2]
            )
        );
    }

    #[test]
    fn test_message_mentions() {
        let subject = ChangeId::new_unchecked("I0123456789");
        assert_eq!(
            GerritQuery::message_mentions(subject.as_str(), &subject).query(),
            "message:I0123456789 -change:I0123456789"
        );
    }

    #[test]
    fn test_into_args() {
        let args = GerritQuery::change_number(ChangeNumber::from(4711))
            .current_patch_set()
            .commit_message()
            .into_args();
        assert_eq!(
            args,
            vec![
                "query",
                "--format",
                "json",
                "--commit-message",
                "--current-patch-set",
                "--",
                "change:4711",
            ]
        );
    }
}
