use std::process::ExitCode;

mod change;
mod change_id;
mod change_number;
mod change_status;
mod cli;
mod commit_hash;
mod config;
mod crd;
mod depends_on;
mod depends_on_extractor;
mod error;
#[cfg(test)]
mod fake_gerrit;
mod fan_out;
mod format_bulleted_list;
mod gerrit;
mod gerrit_query;
mod git;
mod install_tracing;
mod needed_by;
mod patch_set_info;
mod patchset;
mod query_result;
mod report_format;
mod resolver;
mod revision;

use calm_io::stdoutln;
use clap::Parser;
use cli::Command;
use cli::Opts;
use config::Config;
use crd::CrdReport;
use depends_on_extractor::extract_depends_on;
use error::CrdError;
use format_bulleted_list::format_bulleted_list;
use git::Git;
use install_tracing::install_tracing;
use miette::Context;
use miette::IntoDiagnostic;
use needed_by::needed_by;
use report_format::format_depends_on;
use report_format::format_error_json;
use report_format::format_json;
use report_format::format_needed_by;
use report_format::format_report;

fn main() -> miette::Result<ExitCode> {
    let opts = Opts::parse();
    install_tracing(&opts.log)?;
    let config = Config::from(&opts);

    match opts.command {
        Command::Report { target } => {
            let gerrit = Git::new().gerrit(&config)?;
            let outcome = gerrit
                .subject(&target.revision(), target.project.as_deref())
                .and_then(|subject| CrdReport::compute(&gerrit, &gerrit, &subject, &config));
            emit(target.json, outcome, |report| {
                if target.json {
                    format_json(report)
                } else {
                    format_report(report, target.timestamp_format())
                }
            })
        }
        Command::DependsOn { target } => {
            let gerrit = Git::new().gerrit(&config)?;
            let outcome = gerrit
                .subject(&target.revision(), target.project.as_deref())
                .and_then(|subject| subject.depends_on(&gerrit, &gerrit));
            emit(target.json, outcome, |depends_on| {
                if target.json {
                    format_json(depends_on)
                } else {
                    format_depends_on(
                        &depends_on.found,
                        &depends_on.missing,
                        target.timestamp_format(),
                    )
                }
            })
        }
        Command::NeededBy { target, change_id } => {
            let gerrit = Git::new().gerrit(&config)?;
            let outcome = match change_id {
                Some(change_id) => Ok(change_id),
                None => gerrit
                    .subject(&target.revision(), target.project.as_deref())
                    .map(|subject| subject.change_id),
            }
            .and_then(|change_id| needed_by(&gerrit, &gerrit, &change_id, config.fan_out));
            emit(target.json, outcome, |needed_by| {
                if target.json {
                    format_json(needed_by)
                } else {
                    format_needed_by(needed_by, target.timestamp_format())
                }
            })
        }
        Command::Extract { file, commit } => {
            let commit_message = match file {
                Some(path) => fs_err::read_to_string(&path)
                    .into_diagnostic()
                    .wrap_err("Failed to read commit message")?,
                None => {
                    let commit = commit.as_deref().unwrap_or("HEAD");
                    Git::new()
                        .commit_message(commit)
                        .wrap_err_with(|| format!("Failed to read commit message of {commit}"))?
                }
            };
            for change_id in extract_depends_on(&commit_message) {
                let _ = stdoutln!("{change_id}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print a command's result, or its error along with a status-specific exit code.
fn emit<T>(
    json: bool,
    outcome: Result<T, CrdError>,
    render: impl FnOnce(&T) -> miette::Result<String>,
) -> miette::Result<ExitCode> {
    match outcome {
        Ok(value) => {
            let _ = stdoutln!("{}", render(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let status = error.status();
            tracing::debug!(%status, "Request failed");
            if json {
                let _ = stdoutln!("{}", format_error_json(&error)?);
            } else {
                eprintln!("{:?}", miette::Report::new(error));
            }
            Ok(ExitCode::from(status.exit_code()))
        }
    }
}
