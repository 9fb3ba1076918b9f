use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::depends_on_extractor::extract_depends_on;
use crate::error::CrdError;
use crate::fan_out::try_map_bounded;
use crate::resolver::ChangeResolver;
use crate::resolver::CommitMessageSource;

/// Find the changes which declare `Depends-On: {change_id}`.
///
/// This is a search for changes mentioning `change_id` anywhere in their commit message
/// ([`candidates`]), followed by re-reading each candidate's message to check the mention is
/// an actual declaration ([`confirm`]).
#[tracing::instrument(level = "debug", skip(source, resolver))]
pub fn needed_by(
    source: &impl CommitMessageSource,
    resolver: &impl ChangeResolver,
    change_id: &ChangeId,
    fan_out: usize,
) -> Result<Vec<ChangeSummary>, CrdError> {
    let candidates = candidates(resolver, change_id)?;
    confirm(source, change_id, candidates, fan_out)
}

/// Changes other than `change_id` whose commit message mentions it.
///
/// These may mention it for any reason, like in a revert or a comment.
pub fn candidates(
    resolver: &impl ChangeResolver,
    change_id: &ChangeId,
) -> Result<Vec<ChangeSummary>, CrdError> {
    let candidates = resolver.search_messages(change_id.as_str(), change_id)?;
    tracing::debug!(
        %change_id,
        candidates = candidates.len(),
        "Found changes mentioning change ID"
    );
    Ok(candidates)
}

/// Keep the candidates whose own `Depends-On` declarations include `change_id`.
///
/// Messages are read on up to `fan_out` threads; the output stays in candidate order. If any
/// message can't be read, the whole batch fails.
pub fn confirm(
    source: &impl CommitMessageSource,
    change_id: &ChangeId,
    candidates: Vec<ChangeSummary>,
    fan_out: usize,
) -> Result<Vec<ChangeSummary>, CrdError> {
    let confirmed = try_map_bounded(&candidates, fan_out, |candidate| {
        let commit_message = source.fetch_change(candidate)?;
        let declares = extract_depends_on(&commit_message).contains(change_id);
        if declares {
            tracing::debug!(%change_id, needed_by = %candidate.id, number = %candidate.number, "Change is needed by");
        } else {
            tracing::debug!(%change_id, candidate = %candidate.id, number = %candidate.number, "Candidate mentions change without depending on it");
        }
        Ok::<_, CrdError>(declares)
    })?;

    Ok(candidates
        .into_iter()
        .zip(confirmed)
        .filter_map(|(candidate, declares)| declares.then_some(candidate))
        .collect())
}
