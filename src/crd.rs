use std::thread;

use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::config::Config;
use crate::depends_on::DependsOn;
use crate::error::CrdError;
use crate::needed_by::needed_by;
use crate::resolver::ChangeResolver;
use crate::resolver::CommitMessageSource;

/// The revision a report is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub change_id: ChangeId,
    pub project: String,
    pub revision: CommitHash,
    /// The message of `revision`, when Gerrit already told us it.
    pub commit_message: Option<String>,
}

impl Subject {
    /// The subject for `revision` of `change`.
    ///
    /// Gerrit only reports the commit message of the current patch set, so the message is kept
    /// only when `revision` is that patch set.
    pub fn from_change(change: ChangeSummary, revision: CommitHash) -> Self {
        let is_current = change
            .current_patch_set
            .as_ref()
            .is_some_and(|patch_set| patch_set.revision == revision);
        Self {
            commit_message: change.commit_message.filter(|_| is_current),
            change_id: change.id,
            project: change.project,
            revision,
        }
    }

    /// Resolve this revision's `Depends-On` declarations, only reading its message from `source`
    /// if we don't have it yet.
    pub fn depends_on(
        &self,
        source: &impl CommitMessageSource,
        resolver: &impl ChangeResolver,
    ) -> Result<DependsOn, CrdError> {
        match &self.commit_message {
            Some(commit_message) => DependsOn::from_commit_message(resolver, commit_message),
            None => DependsOn::resolve(source, resolver, &self.project, &self.revision),
        }
    }
}

/// Cross-repository dependencies of a change revision.
#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrdReport {
    /// Changes this revision depends on which exist on this server.
    pub depends_on_found: Vec<ChangeSummary>,
    /// Change IDs this revision depends on which don't exist on this server.
    pub depends_on_missing: Vec<ChangeId>,
    /// Changes which depend on this change.
    pub needed_by: Vec<ChangeSummary>,
    /// Whether this change and another change depend on each other.
    pub cycle: bool,
}

impl CrdReport {
    /// Combine both directions of a change's dependencies.
    pub fn new(depends_on: DependsOn, needed_by: Vec<ChangeSummary>) -> Self {
        let cycle = has_cycle(&depends_on, &needed_by);
        Self {
            depends_on_found: depends_on.found,
            depends_on_missing: depends_on.missing,
            needed_by,
            cycle,
        }
    }

    /// Compute the report for `subject`.
    ///
    /// The `Depends-On` and needed-by halves are resolved concurrently; if either fails, so does
    /// the report.
    #[tracing::instrument(level = "debug", skip(source, resolver, config))]
    pub fn compute(
        source: &impl CommitMessageSource,
        resolver: &impl ChangeResolver,
        subject: &Subject,
        config: &Config,
    ) -> Result<Self, CrdError> {
        let (depends_on, needed_by) = thread::scope(|scope| {
            let depends_on = scope.spawn(|| subject.depends_on(source, resolver));
            let needed_by = needed_by(source, resolver, &subject.change_id, config.fan_out);
            let depends_on = depends_on
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (depends_on, needed_by)
        });

        Ok(Self::new(depends_on?, needed_by?))
    }
}

/// Does any change which needs this one also appear among the changes this one depends on?
///
/// Only two-change cycles are detected.
pub fn has_cycle(depends_on: &DependsOn, needed_by: &[ChangeSummary]) -> bool {
    let depends_on = depends_on.change_ids();
    let mut cycle = false;
    for change in needed_by {
        if depends_on.contains(&change.id) {
            tracing::debug!(change_id = %change.id, number = %change.number, "Detected dependency cycle");
            cycle = true;
        }
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gerrit::change;
    use crate::fake_gerrit::change_id;
    use crate::fake_gerrit::commit_hash;
    use crate::fake_gerrit::FakeGerrit;
    use crate::fake_gerrit::PROJECT;
    use crate::query_result::QueryResult;
    use indoc::formatdoc;
    use pretty_assertions::assert_eq;

    const SUBJECT: u64 = 4711;

    fn subject() -> Subject {
        Subject {
            change_id: change_id(SUBJECT),
            project: PROJECT.to_owned(),
            revision: commit_hash(SUBJECT),
            commit_message: None,
        }
    }

    fn report(gerrit: &FakeGerrit) -> Result<CrdReport, CrdError> {
        CrdReport::compute(gerrit, gerrit, &subject(), &Config::default())
    }

    fn needs_subject() -> String {
        format!("subject\n\nDepends-On: {}", change_id(SUBJECT))
    }

    #[test]
    fn test_no_dependencies() {
        let gerrit = FakeGerrit::new().with_change(change(SUBJECT), "subject");
        assert_eq!(report(&gerrit).unwrap(), CrdReport::default());
    }

    #[test]
    fn test_single_missing() {
        let missing = ChangeId::new_unchecked(format!("I{}", "0".repeat(40)));
        let gerrit = FakeGerrit::new()
            .with_change(change(SUBJECT), &format!("subject\nDepends-On: {missing}"));
        assert_eq!(
            report(&gerrit).unwrap(),
            CrdReport {
                depends_on_found: vec![],
                depends_on_missing: vec![missing],
                needed_by: vec![],
                cycle: false,
            }
        );
    }

    #[test]
    fn test_mixed() {
        let message = formatdoc! {"
            subject

            Depends-On: {}
            Depends-On: {}
            ",
            change_id(2),
            change_id(4),
        };
        let gerrit = FakeGerrit::new()
            .with_change(change(SUBJECT), &message)
            .with_change(change(1), &needs_subject())
            .with_change(change(2), "two")
            .with_change(change(3), &needs_subject());
        assert_eq!(
            report(&gerrit).unwrap(),
            CrdReport {
                depends_on_found: vec![change(2)],
                depends_on_missing: vec![change_id(4)],
                needed_by: vec![change(1), change(3)],
                cycle: false,
            }
        );
    }

    #[test]
    fn test_simple_cycle() {
        let gerrit = FakeGerrit::new()
            .with_change(
                change(SUBJECT),
                &format!("subject\nDepends-On: {}", change_id(1)),
            )
            .with_change(change(1), &needs_subject());
        assert_eq!(
            report(&gerrit).unwrap(),
            CrdReport {
                depends_on_found: vec![change(1)],
                depends_on_missing: vec![],
                needed_by: vec![change(1)],
                cycle: true,
            }
        );
    }

    #[test]
    fn test_cycle_through_missing() {
        // The other change is only visible to the search, e.g. it's on a branch the lookup
        // doesn't cover; it still closes the cycle.
        let depends_on = DependsOn {
            found: vec![],
            missing: vec![change_id(1)],
        };
        assert!(has_cycle(&depends_on, &[change(1)]));
    }

    #[test]
    fn test_no_cycle_with_unrelated_needed_by() {
        let depends_on = DependsOn {
            found: vec![change(2)],
            missing: vec![],
        };
        assert!(!has_cycle(&depends_on, &[change(3)]));
        assert!(!has_cycle(&depends_on, &[]));
    }

    #[test]
    fn test_mention_does_not_make_cycle() {
        let gerrit = FakeGerrit::new()
            .with_change(
                change(SUBJECT),
                &format!("subject\nDepends-On: {}", change_id(1)),
            )
            .with_change(
                change(1),
                &format!("Reverts {} for now", change_id(SUBJECT)),
            );
        let report = report(&gerrit).unwrap();
        assert_eq!(report.needed_by, vec![]);
        assert!(!report.cycle);
    }

    #[test]
    fn test_depends_on_failure_fails_report() {
        let gerrit = FakeGerrit::new()
            .with_change(
                change(SUBJECT),
                &format!("subject\nDepends-On: {}", change_id(1)),
            )
            .with_change(change(2), &needs_subject());
        *gerrit.lookup_error.lock() = Some(CrdError::PermissionDenied("change 1".to_owned()));
        assert!(matches!(report(&gerrit), Err(CrdError::PermissionDenied(_))));
    }

    #[test]
    fn test_missing_revision_fails_report() {
        let gerrit = FakeGerrit::new().with_change(change(2), &needs_subject());
        assert!(matches!(report(&gerrit), Err(CrdError::NotFound(_))));
    }

    #[test]
    fn test_subject_message_from_query_row() {
        let row = format!(
            r#"{{"project":"nova","branch":"master","id":"{}","number":4711,"subject":"Subject","status":"NEW","commitMessage":"Subject\n\nDepends-On: {}\n","currentPatchSet":{{"number":3,"revision":"{}","ref":"refs/changes/11/4711/3"}}}}"#,
            change_id(SUBJECT),
            change_id(1),
            commit_hash(SUBJECT),
        );
        let row_change = QueryResult::<ChangeSummary>::from_stdout("change:4711", &row)
            .unwrap()
            .changes
            .swap_remove(0);
        let subject = Subject::from_change(row_change, commit_hash(SUBJECT));
        assert_eq!(subject.project, "nova");

        // The subject's project and revision are unknown here; its message must not be fetched.
        let gerrit = FakeGerrit::new().with_change(change(1), "one");
        let report = CrdReport::compute(&gerrit, &gerrit, &subject, &Config::default()).unwrap();
        assert_eq!(report.depends_on_found, vec![change(1)]);
        assert!(gerrit.fetched.lock().is_empty());
    }

    #[test]
    fn test_subject_from_older_patch_set_has_no_message() {
        let mut change = change(SUBJECT);
        change.commit_message = Some("current patch set message".to_owned());
        let subject = Subject::from_change(change, commit_hash(1));
        assert_eq!(subject.commit_message, None);
        assert_eq!(subject.revision, commit_hash(1));
    }

    #[test]
    fn test_report_json_shape() {
        let report = CrdReport {
            depends_on_found: vec![],
            depends_on_missing: vec![change_id(4)],
            needed_by: vec![],
            cycle: false,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "dependsOnFound": [],
                "dependsOnMissing": [change_id(4).to_string()],
                "neededBy": [],
                "cycle": false,
            })
        );
    }
}
