//! Error taxonomy for upstream fetches and the aggregate operation.

use std::fmt;
use thiserror::Error;

/// Failure of a single upstream fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream returned nothing usable for this identifier.
    #[error("not found")]
    NotFound,

    /// Upstream unreachable, timed out, or answered with a non-2xx status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream payload was malformed or missing required fields.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        FetchError::Decode(message.into())
    }

    /// Stable machine-readable kind, used in error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound => "not_found",
            FetchError::Transport(_) => "transport_error",
            FetchError::Decode(_) => "decode_error",
        }
    }
}

/// Which sub-fetch of an aggregation produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Profile,
    Posts,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Profile => "profile",
            Source::Posts => "posts",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of an aggregate call. Carries the first failure observed.
#[derive(Debug, Error)]
pub enum AggregateFailure {
    /// One of the sub-fetches failed.
    #[error("{side} fetch failed: {error}")]
    Fetch {
        side: Source,
        #[source]
        error: FetchError,
    },

    /// The per-call deadline elapsed before both fetches finished.
    #[error("deadline of {0}ms exceeded")]
    DeadlineExceeded(u64),

    /// The caller cancelled the operation.
    #[error("aggregation cancelled")]
    Cancelled,

    /// A fetch task died without producing a result (panic).
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl AggregateFailure {
    pub fn fetch(side: Source, error: FetchError) -> Self {
        AggregateFailure::Fetch { side, error }
    }

    /// The failing sub-fetch, if the failure came from one.
    pub fn side(&self) -> Option<Source> {
        match self {
            AggregateFailure::Fetch { side, .. } => Some(*side),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AggregateFailure::Fetch { error, .. } => error.kind(),
            AggregateFailure::DeadlineExceeded(_) => "deadline_exceeded",
            AggregateFailure::Cancelled => "cancelled",
            AggregateFailure::TaskFailed(_) => "task_failed",
        }
    }
}
