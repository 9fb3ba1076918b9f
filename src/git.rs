use std::process::Command;
use std::process::Stdio;

use command_error::CommandExt;
use command_error::OutputContext;
use miette::miette;
use miette::Context;
use miette::IntoDiagnostic;
use utf8_command::Utf8Output;

use crate::commit_hash::CommitHash;
use crate::config::Config;
use crate::error::CrdError;
use crate::format_bulleted_list;
use crate::gerrit::Gerrit;

/// `git` CLI wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Git {}

impl Git {
    pub fn new() -> Self {
        Self {}
    }

    /// Get a `git` command.
    pub fn command(&self) -> Command {
        Command::new("git")
    }

    /// Get a list of all `git remote`s.
    pub fn remotes(&self) -> miette::Result<Vec<String>> {
        Ok(self
            .command()
            .arg("remote")
            .output_checked_utf8()
            .into_diagnostic()
            .wrap_err("Failed to list Git remotes")?
            .stdout
            .lines()
            .map(|line| line.to_owned())
            .collect())
    }

    /// Get the (fetch) URL for the given remote.
    pub fn remote_url(&self, remote: &str) -> miette::Result<String> {
        Ok(self
            .command()
            .args(["remote", "get-url", remote])
            .output_checked_utf8()
            .into_diagnostic()
            .wrap_err("Failed to get Git remote URL")?
            .stdout
            .trim()
            .to_owned())
    }

    /// Is `commit` present in the local repository?
    pub fn has_commit(&self, commit: &CommitHash) -> Result<bool, CrdError> {
        Ok(self
            .command()
            .args(["cat-file", "-e", &format!("{commit}^{{commit}}")])
            .stderr(Stdio::null())
            .status()?
            .success())
    }

    /// Resolve a revision like `HEAD` to a full commit hash.
    pub fn rev_parse(&self, revision: &str) -> Result<CommitHash, CrdError> {
        if is_malformed_revision(revision) {
            return Err(CrdError::BadRequest(format!(
                "`{revision}` is not a valid revision"
            )));
        }
        self.command()
            .args(["rev-parse", "--verify", "--quiet", &format!("{revision}^{{commit}}")])
            .output_checked_as(|context: OutputContext<Utf8Output>| {
                if context.status().success() {
                    context.output().stdout.trim().parse()
                } else {
                    Err(rev_parse_error(
                        revision,
                        context.status().code(),
                        &context.output().stderr,
                    )
                    .unwrap_or_else(|| CrdError::from(context.error())))
                }
            })
    }

    pub fn commit_message(&self, commit: &str) -> Result<String, CrdError> {
        Ok(self
            .command()
            .args(["show", "--no-patch", "--format=%B", commit])
            .output_checked_utf8()?
            .stdout)
    }

    /// Fetch a ref (like a patch set's `refs/changes/...`) from a repository URL.
    pub fn fetch(&self, url: &str, ref_name: &str) -> Result<(), CrdError> {
        self.command()
            .args(["fetch", "--quiet", url, ref_name])
            .status_checked()?;
        Ok(())
    }

    /// Find the Gerrit server among this repository's remotes.
    pub fn gerrit(&self, config: &Config) -> miette::Result<Gerrit> {
        let mut tried = Vec::new();

        if let Some(remote_name) = &config.remote {
            tracing::debug!(%remote_name, "Looking for remote");
        }

        for remote in self.remotes()? {
            if let Some(remote_name) = &config.remote {
                if remote_name != &remote {
                    tracing::debug!(remote, "Skipping remote");
                    continue;
                }
            }

            let url = self.remote_url(&remote)?;

            if config.remote.is_none() && !remote.contains("gerrit") && !url.contains("gerrit") {
                tracing::debug!(remote, url, "Skipping remote");
                continue;
            }

            tried.push(url.clone());

            match Gerrit::parse_from_remote_url(&url) {
                Ok(gerrit) => {
                    tracing::debug!(remote, project = gerrit.project(), "Using Gerrit remote");
                    return Ok(gerrit
                        .with_git(self.clone())
                        .with_connect_timeout(config.connect_timeout));
                }
                Err(error) => {
                    tracing::debug!(remote, url, %error, "Failed to parse remote URL");
                }
            }
        }

        Err(miette!(
            "Failed to parse Gerrit configuration from Git remotes; use `--remote` to pick one. Tried to parse these remotes:\n{}",
            format_bulleted_list(tried)
        ))
    }
}

/// Can `revision` never name a single commit, whatever the repository contains?
fn is_malformed_revision(revision: &str) -> bool {
    let mut depth = 0usize;
    for c in revision.chars() {
        match c {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(new_depth) => depth = new_depth,
                None => return true,
            },
            _ if c.is_control() || (c.is_whitespace() && depth == 0) => return true,
            _ => {}
        }
    }
    revision.is_empty() || revision.starts_with('-') || revision.contains("..") || depth != 0
}

/// Classify a failed `git rev-parse --verify --quiet`.
///
/// `None` means the failure isn't about the revision (no repository, a broken `git`), and should
/// be reported as-is.
fn rev_parse_error(revision: &str, code: Option<i32>, stderr: &str) -> Option<CrdError> {
    if stderr.contains("bad revision")
        || stderr.contains("invalid object name")
        || stderr.contains("ambiguous argument")
    {
        Some(CrdError::BadRequest(format!(
            "`{revision}` is not a valid revision: {}",
            stderr.trim()
        )))
    } else if code == Some(1) {
        Some(CrdError::NotFound(format!(
            "No commit `{revision}` in the local repository"
        )))
    } else {
        None
    }
}
