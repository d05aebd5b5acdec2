//! Errors returned by the store and the reconciliation engine.
//!
//! Every failure is handed back to the caller as an [`EngineError`]; nothing
//! in the engine panics on bad input or a rejected balance change.
use thiserror::Error;

pub(crate) type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub(crate) enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Cannot delete: {0}")]
    CannotDelete(String),
    /// A wallet write expected a revision that is no longer current.
    #[error("Conflicting update: {0}")]
    Conflict(String),
    /// A wallet write landed but its paired transaction write did not.
    #[error("Inconsistent write: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

/// Stable tag for each [`EngineError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    InvalidInput,
    NotFound,
    InsufficientBalance,
    CannotDelete,
    Conflict,
    Inconsistent,
    Storage,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid-input",
            Self::NotFound => "not-found",
            Self::InsufficientBalance => "insufficient-balance",
            Self::CannotDelete => "cannot-delete",
            Self::Conflict => "conflict",
            Self::Inconsistent => "inconsistent",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl EngineError {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
            Self::CannotDelete(_) => ErrorKind::CannotDelete,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Inconsistent(_) => ErrorKind::Inconsistent,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Only storage failures and lost races are worth retrying as-is.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Storage(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::CannotDelete(a), Self::CannotDelete(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Inconsistent(a), Self::Inconsistent(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
