use thiserror::Error;

/// Discriminant of a [`PersistError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ThreadNotFound,
    InvalidState,
    ReadError,
    WriteError,
    ValidationError,
    SummarizationError,
}

#[derive(Error, Debug)]
pub enum PersistError {
    /// The store returns `None` for missing threads; this is for callers
    /// that need to turn that into an error.
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Summarization failed: {0}")]
    Summarization(#[source] anyhow::Error),
}

impl PersistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ThreadNotFound(_) => ErrorKind::ThreadNotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Read { .. } => ErrorKind::ReadError,
            Self::Write { .. } => ErrorKind::WriteError,
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Summarization(_) => ErrorKind::SummarizationError,
        }
    }

    pub(crate) fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
