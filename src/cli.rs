use camino::Utf8PathBuf;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::change::TimestampFormat;
use crate::change_id::ChangeId;
use crate::config::DEFAULT_FAN_OUT;
use crate::revision::RevisionKey;

/// Cross-repository `Depends-On` reports for Gerrit changes.
#[derive(Debug, Clone, Parser)]
#[command(version, author, about)]
#[command(max_term_width = 100, disable_help_subcommand = true)]
pub struct Opts {
    /// Log filter directives, of the form `target[span{field=value}]=level`, where all components
    /// except the level are optional.
    ///
    /// Try `debug` or `trace`.
    #[arg(long, default_value = "info", env = "GIT_CRD_LOG", global = true)]
    pub log: String,

    /// The Git remote pointing at Gerrit.
    ///
    /// Defaults to the first remote whose name or URL mentions `gerrit`.
    #[arg(long, env = "GIT_CRD_REMOTE", global = true)]
    pub remote: Option<String>,

    /// How many candidate commit messages to read at once when finding dependent changes.
    #[arg(long, default_value_t = DEFAULT_FAN_OUT, env = "GIT_CRD_FAN_OUT", global = true)]
    pub fan_out: usize,

    /// Seconds to wait for `ssh` to connect to Gerrit.
    #[arg(long, default_value_t = 10, env = "GIT_CRD_CONNECT_TIMEOUT", global = true)]
    pub connect_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the changes a revision depends on, the changes that need it, and whether they form a
    /// cycle.
    Report {
        #[command(flatten)]
        target: Target,
    },
    /// Print the change IDs a commit message declares with `Depends-On:` footers.
    Extract {
        /// Read the commit message from this file instead of a commit.
        #[arg(long, conflicts_with = "commit")]
        file: Option<Utf8PathBuf>,

        /// The commit to read. Defaults to `HEAD`.
        commit: Option<String>,
    },
    /// Show the changes a revision depends on.
    DependsOn {
        #[command(flatten)]
        target: Target,
    },
    /// Show the changes which depend on a change.
    NeededBy {
        #[command(flatten)]
        target: Target,

        /// Look up changes depending on this change ID, rather than finding it from a revision.
        #[arg(long, conflicts_with = "target")]
        change_id: Option<ChangeId>,
    },
}

/// The revision to report on.
#[derive(Debug, Clone, Args)]
pub struct Target {
    /// A change number (`1234`), a change and patch set (`1234/3`), or a commit.
    ///
    /// Defaults to `HEAD`.
    #[arg(value_name = "TARGET", id = "target")]
    pub revision: Option<RevisionKey>,

    /// The project to look for a commit in. Defaults to the remote's project.
    #[arg(long)]
    pub project: Option<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Show timestamps in 24-hour time.
    #[arg(long = "24h")]
    pub twenty_four_hour: bool,
}

impl Target {
    pub fn revision(&self) -> RevisionKey {
        self.revision.clone().unwrap_or_default()
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        if self.twenty_four_hour {
            TimestampFormat::TwentyFourHour
        } else {
            TimestampFormat::TwelveHour
        }
    }
}
