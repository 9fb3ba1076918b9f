use std::fmt::Display;

use miette::Diagnostic;

/// An error computing a CRD report.
///
/// Every kind is fatal for the request it occurs in; nothing here is retried.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum CrdError {
    /// The caller gave us something we can't parse, like a truncated commit hash.
    #[error("Bad request: {0}")]
    #[diagnostic(code(crd::bad_request))]
    BadRequest(String),

    /// A project, revision, or change doesn't exist (or isn't visible).
    #[error("Not found: {0}")]
    #[diagnostic(code(crd::not_found))]
    NotFound(String),

    /// The caller isn't allowed to see something needed to build the report.
    #[error("Permission denied: {0}")]
    #[diagnostic(code(crd::permission_denied))]
    PermissionDenied(String),

    /// Gerrit rejected a search query.
    #[error("Gerrit rejected query `{query}`: {message}")]
    #[diagnostic(code(crd::bad_query))]
    BadQuery { query: String, message: String },

    /// Talking to Gerrit or `git` failed.
    #[error("{0}")]
    #[diagnostic(code(crd::transport))]
    Transport(String),
}

impl CrdError {
    /// The user-visible status for this error.
    pub fn status(&self) -> ErrorStatus {
        match self {
            CrdError::BadRequest(_) | CrdError::BadQuery { .. } => ErrorStatus::BadRequest,
            CrdError::NotFound(_) => ErrorStatus::NotFound,
            CrdError::PermissionDenied(_) => ErrorStatus::PermissionDenied,
            CrdError::Transport(_) => ErrorStatus::Unavailable,
        }
    }

    pub fn transport(error: impl Display) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<command_error::Error> for CrdError {
    fn from(error: command_error::Error) -> Self {
        Self::transport(error)
    }
}

impl From<std::io::Error> for CrdError {
    fn from(error: std::io::Error) -> Self {
        Self::transport(error)
    }
}

/// How a failed report is surfaced to whoever asked for it.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorStatus {
    BadRequest,
    NotFound,
    PermissionDenied,
    Unavailable,
}

impl ErrorStatus {
    /// The equivalent HTTP status code.
    pub fn http_code(&self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::PermissionDenied => 403,
            ErrorStatus::NotFound => 404,
            ErrorStatus::Unavailable => 503,
        }
    }

    /// The process exit code to use when a report fails with this status.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorStatus::BadRequest => 2,
            ErrorStatus::NotFound => 3,
            ErrorStatus::PermissionDenied => 4,
            ErrorStatus::Unavailable => 5,
        }
    }
}

impl Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorStatus::BadRequest => write!(f, "bad request"),
            ErrorStatus::NotFound => write!(f, "not found"),
            ErrorStatus::PermissionDenied => write!(f, "permission denied"),
            ErrorStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}
