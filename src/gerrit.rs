use std::collections::BTreeSet;
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use command_error::CommandExt;
use command_error::OutputContext;
use miette::miette;
use miette::Context;
use miette::IntoDiagnostic;
use regex::Regex;
use serde::de::DeserializeOwned;
use utf8_command::Utf8Output;

use crate::change::ChangeSummary;
use crate::change_id::ChangeId;
use crate::commit_hash::CommitHash;
use crate::crd::Subject;
use crate::error::CrdError;
use crate::gerrit_query::GerritQuery;
use crate::git::Git;
use crate::query_result::QueryResult;
use crate::resolver::ChangeResolver;
use crate::resolver::CommitMessageSource;
use crate::revision::RevisionKey;

/// Gerrit SSH client wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gerrit {
    username: String,
    host: String,
    port: u16,
    project: String,
    connect_timeout: Duration,
    git: Git,
}

impl Gerrit {
    /// Parse a Gerrit configuration from a Git remote URL.
    pub fn parse_from_remote_url(url: &str) -> miette::Result<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let captures = RE
            .get_or_init(|| {
                // ssh://USER@HOST:PORT/PROJECT
                Regex::new(
                    r"(?x)
                    ^
                    ssh://
                    (?P<user>[[:word:]]+)
                    @
                    (?P<host>[[:word:]][[:word:].-]*)
                    :
                    (?P<port>[0-9]+)
                    /
                    (?P<project>[[:word:]./-]+?)
                    (?:\.git)?
                    $",
                )
                .expect("Regex parses")
            })
            .captures(url);
        match captures {
            Some(captures) => {
                let port = &captures["port"];
                let port = port.parse().into_diagnostic().wrap_err_with(|| {
                    format!("Failed to parse port `{port}` from Git remote: {url}")
                })?;

                Ok(Self {
                    username: captures["user"].to_owned(),
                    host: captures["host"].to_owned(),
                    port,
                    project: captures["project"].to_owned(),
                    connect_timeout: Duration::from_secs(10),
                    git: Git::new(),
                })
            }
            None => Err(miette!("Could not parse Git remote as Gerrit URL: {url}")),
        }
    }

    pub fn with_git(mut self, git: Git) -> Self {
        self.git = git;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// The project of the remote this client was configured from.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The `ssh` destination to connect to.
    pub fn connect_to(&self) -> String {
        format!("ssh://{}@{}:{}", self.username, self.host, self.port)
    }

    /// The URL to fetch from for a project on this server.
    pub fn project_url(&self, project: &str) -> String {
        format!("{}/{}", self.connect_to(), project)
    }

    /// A `gerrit` command to run on the remote.
    pub fn command(&self, args: impl IntoIterator<Item = impl AsRef<str>>) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args([
            "-o".to_owned(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            self.connect_to(),
            "gerrit".to_owned(),
        ]);
        cmd.args(
            args.into_iter()
                .map(|arg| shell_words::quote(arg.as_ref()).into_owned()),
        );
        cmd
    }

    pub fn query<T: DeserializeOwned>(&self, query: GerritQuery) -> Result<QueryResult<T>, CrdError> {
        let query_string = query.query().to_owned();
        tracing::debug!(query = %query_string, "Querying Gerrit");
        let result = self.command(query.into_args()).output_checked_as(
            |context: OutputContext<Utf8Output>| {
                if context.status().success() {
                    QueryResult::from_stdout(&query_string, &context.output().stdout)
                } else if is_permission_error(&context.output().stderr) {
                    Err(CrdError::PermissionDenied(format!(
                        "Gerrit refused query `{query_string}`: {}",
                        context.output().stderr.trim()
                    )))
                } else {
                    Err(CrdError::from(context.error()))
                }
            },
        )?;
        if let Some(stats) = &result.stats {
            tracing::debug!(rows = stats.row_count, more = stats.more_changes, "Query finished");
        }
        Ok(result)
    }

    /// Query for exactly one change, failing with [`CrdError::NotFound`] if there are none.
    fn query_one(&self, query: GerritQuery, what: &str) -> Result<ChangeSummary, CrdError> {
        let mut result = self.query::<ChangeSummary>(query)?;
        if result.changes.len() > 1 {
            tracing::debug!(what, rows = result.changes.len(), "Query matched several changes, using the first");
        }
        if result.changes.is_empty() {
            Err(CrdError::NotFound(what.to_owned()))
        } else {
            Ok(result.changes.swap_remove(0))
        }
    }

    /// Find the change and revision a [`RevisionKey`] refers to.
    ///
    /// `project` restricts commit lookups; it defaults to this remote's project. The query asks
    /// for the commit message too, so reports on a current patch set never fetch from Gerrit.
    pub fn subject(&self, key: &RevisionKey, project: Option<&str>) -> Result<Subject, CrdError> {
        match key {
            RevisionKey::Change(number) => {
                let change = self.query_one(
                    GerritQuery::change_number(*number)
                        .current_patch_set()
                        .commit_message(),
                    &format!("change {number}"),
                )?;
                let revision = change.require_current_patch_set()?.revision.clone();
                Ok(Subject::from_change(change, revision))
            }
            RevisionKey::Patchset(patchset) => {
                let change = self.query_one(
                    GerritQuery::change_number(patchset.change)
                        .patch_sets()
                        .current_patch_set()
                        .commit_message(),
                    &format!("change {}", patchset.change),
                )?;
                let revision = change
                    .patch_sets
                    .iter()
                    .find(|info| info.number == patchset.patchset)
                    .map(|info| info.revision.clone())
                    .ok_or_else(|| CrdError::NotFound(format!("patch set {patchset}")))?;
                Ok(Subject::from_change(change, revision))
            }
            RevisionKey::Commit(revision) => {
                let commit = match revision.parse::<CommitHash>() {
                    Ok(commit) => commit,
                    Err(_) => self.git.rev_parse(revision)?,
                };
                let project = project.unwrap_or(self.project.as_str());
                let change = self.query_one(
                    GerritQuery::commit(&commit, project)
                        .current_patch_set()
                        .commit_message(),
                    &format!("a change in {project} with commit {commit}"),
                )?;
                Ok(Subject::from_change(change, commit))
            }
        }
    }
}

fn is_permission_error(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("not permitted")
        || stderr.contains("permission denied")
        || stderr.contains("not authorized")
}

impl ChangeResolver for Gerrit {
    fn find_by_change_ids(
        &self,
        change_ids: &BTreeSet<ChangeId>,
    ) -> Result<Vec<ChangeSummary>, CrdError> {
        Ok(self
            .query(
                GerritQuery::any_change_id(change_ids)
                    .current_patch_set()
                    .no_limit(),
            )?
            .changes)
    }

    fn search_messages(
        &self,
        text: &str,
        excluding: &ChangeId,
    ) -> Result<Vec<ChangeSummary>, CrdError> {
        Ok(self
            .query(
                GerritQuery::message_mentions(text, excluding)
                    .commit_message()
                    .current_patch_set()
                    .no_limit(),
            )?
            .changes)
    }
}

impl CommitMessageSource for Gerrit {
    fn fetch_revision(&self, project: &str, revision: &CommitHash) -> Result<String, CrdError> {
        if !self.git.has_commit(revision)? {
            let change = self.query_one(
                GerritQuery::commit(revision, project).patch_sets(),
                &format!("{project} commit {revision}"),
            )?;
            let patch_set = change
                .patch_sets
                .iter()
                .find(|info| &info.revision == revision)
                .ok_or_else(|| CrdError::NotFound(format!("{project} commit {revision}")))?;
            tracing::debug!(ref_name = %patch_set.ref_name, revision = revision.abbrev(), "Fetching patch set");
            self.git
                .fetch(&self.project_url(project), &patch_set.ref_name)?;
        }
        self.git.commit_message(revision)
    }
}
