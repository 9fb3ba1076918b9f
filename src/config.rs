use std::time::Duration;

use crate::cli::Opts;

/// How many candidate commit messages to read at once by default.
pub const DEFAULT_FAN_OUT: usize = 8;

/// Settings for computing reports, gathered from the command line and environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// The Git remote pointing at Gerrit, if given explicitly.
    pub remote: Option<String>,
    /// The maximum number of candidate messages to read concurrently.
    pub fan_out: usize,
    /// How long `ssh` waits to connect to Gerrit.
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: None,
            fan_out: DEFAULT_FAN_OUT,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Opts> for Config {
    fn from(opts: &Opts) -> Self {
        Self {
            remote: opts.remote.clone(),
            fan_out: opts.fan_out.max(1),
            connect_timeout: Duration::from_secs(opts.connect_timeout),
        }
    }
}
