use crate::types::PersonId;
use thiserror::Error;

/// Failure reported by the graph-query collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {message}")]
    Parse { message: String },
    #[error("query failed: {message}")]
    Query { message: String },
    #[error("source unavailable: {message}")]
    Unavailable { message: String },
}

impl SourceError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Why a fan-out read produced no data.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A read task panicked or was aborted. Only reachable with unwinding
    /// panics; the release profile sets `panic = "abort"`.
    #[error("read task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Internal,
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("'{0}' not found")]
    NotFound(PersonId),
    #[error("reading {task} failed: {cause}")]
    Internal {
        task: &'static str,
        #[source]
        cause: FetchFailure,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl EngineError {
    pub fn internal(task: &'static str, cause: impl Into<FetchFailure>) -> Self {
        Self::Internal {
            task,
            cause: cause.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Internal { .. } => ErrorKind::Internal,
            EngineError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// HTTP status the transport layer answers with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
            ErrorKind::InvalidInput => 400,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
