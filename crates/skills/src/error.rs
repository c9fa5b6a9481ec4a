use std::{error::Error as StdError, path::PathBuf};

use prompthub_common::FromMessage;

use crate::validate::NameIssue;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("invalid GitHub URL '{url}': expected github.com/<owner>/<repo>")]
    InvalidUrl { url: String },
    #[error("invalid skill name '{name}': {issue}")]
    InvalidName { name: String, issue: NameIssue },
    #[error("{} already exists", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("a skill named '{name}' already exists")]
    Conflict { name: String },
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },
    #[error("unknown platform '{id}'")]
    UnknownPlatform { id: String },
    #[error("failed to execute `{operation}`: {source}")]
    CommandExecution {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{operation}` failed: {stderr}")]
    CommandFailed {
        operation: &'static str,
        stderr: String,
    },
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },
    #[error("{message}")]
    Message { message: String },
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn command_execution(operation: &'static str, source: std::io::Error) -> Self {
        Self::CommandExecution { operation, source }
    }

    #[must_use]
    pub fn command_failed(operation: &'static str, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            operation,
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Validation failures raised before any I/O.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUrl { .. } | Self::InvalidName { .. })
    }

    /// Duplicate name or install directory.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::AlreadyExists { .. })
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

prompthub_common::impl_context!();
