use std::sync::OnceLock;

use regex::Regex;

use crate::change_id::ChangeId;

/// Extract the change IDs declared with `Depends-On:` in a commit message.
///
/// The keyword is case-insensitive and the colon is optional. The change ID must be exactly
/// `I` followed by 40 hex digits; longer runs of hex digits are skipped entirely rather than
/// truncated. Declarations may appear anywhere in the message.
///
/// Results are in the order they appear, duplicates included.
pub fn extract_depends_on(commit_message: &str) -> Vec<ChangeId> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?i: depends-on ) :? \s*
            (?P<change_id> I [[:xdigit:]]{40} )
            # A 41st hex digit means this isn't a change ID at all.
            (?P<overlong> [[:xdigit:]] )?
            ",
        )
        .expect("Regex parses")
    });

    re.captures_iter(commit_message)
        .filter(|captures| captures.name("overlong").is_none())
        .map(|captures| ChangeId::new_unchecked(&captures["change_id"]))
        .inspect(|change_id| tracing::debug!(%change_id, "Found Depends-On"))
        .collect()
}
