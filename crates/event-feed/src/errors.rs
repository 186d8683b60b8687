use cfapps_core_types::{AppGuid, CoreError};
use thiserror::Error;

/// Per-record decode failure. The record is dropped, never surfaced to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record has no parseable timestamp")]
    MissingTimestamp,
}

/// Failure reported by the fetch collaborator for a whole refresh cycle.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },
    #[error("not authorized to read application events")]
    Unauthorized,
    #[error("fetch timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("fetch completed without events or error")]
    EmptyResponse,
    #[error("fetch callback dropped before completion")]
    Abandoned,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("malformed timestamp")]
    MalformedTimestamp,
}

/// Timestamp could not be parsed with the wire pattern.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {input:?}")]
pub struct FormatError {
    kind: ErrorKind,
    input: String,
}

impl FormatError {
    pub fn malformed(input: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedTimestamp,
            input: input.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid argument: {0}")]
    InvalidArg(String),
    #[error("refresh requested for {requested} but feed is attached to {expected}")]
    SubjectMismatch {
        expected: AppGuid,
        requested: AppGuid,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<CoreError> for FeedError {
    fn from(value: CoreError) -> Self {
        FeedError::InvalidArg(value.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
