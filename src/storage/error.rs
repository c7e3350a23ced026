//! Storage layer error types
//!
//! All errors that can occur while reading a repository are defined here.
//! None of them are retried by this crate; callers decide what to do.

use std::path::PathBuf;

use git2::{ErrorClass, ErrorCode};
use thiserror::Error;

/// the main error type for repository access
#[derive(Debug, Error)]
pub enum StorageError {
    /// the requested commit id or ref does not resolve to a commit
    #[error("could not find a commit with the id of {id}")]
    InvalidCommit { id: String },

    /// a caller passed a parameter outside its valid range
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// the VCS backend failed to answer (I/O, corruption, timeout)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] git2::Error),

    /// the path does not hold a git repository
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// no repository is registered under this name
    #[error("repository not found: {0}")]
    RepoNotFound(String),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// build an `InvalidCommit` error for the identifier the caller asked for
    pub fn invalid_commit(id: impl Into<String>) -> Self {
        StorageError::InvalidCommit { id: id.into() }
    }

    /// classify a failed commit lookup for `id`
    ///
    /// a miss becomes `InvalidCommit`; anything else means the backend broke
    /// and stays `BackendUnavailable`.
    pub(crate) fn from_lookup(e: git2::Error, id: impl Into<String>) -> Self {
        if is_lookup_miss(&e) {
            Self::invalid_commit(id)
        } else {
            StorageError::BackendUnavailable(e)
        }
    }

    /// build an `InvalidArgument` error
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        StorageError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::InvalidCommit { .. }
                | StorageError::RepoNotFound(_)
                | StorageError::NotARepository(_)
        )
    }

    /// check if this error was caused by bad caller input
    pub fn is_caller_error(&self) -> bool {
        matches!(self, StorageError::InvalidArgument { .. })
    }

    /// check if this error is recoverable by retry
    ///
    /// identifiers resolve deterministically for a given repository state and
    /// backend failures are left to the caller's retry policy, so this is
    /// always false.
    pub fn is_retriable(&self) -> bool {
        false
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Does this libgit2 error mean "no such object" rather than "backend broke"?
pub(crate) fn is_lookup_miss(e: &git2::Error) -> bool {
    matches!(
        e.code(),
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::InvalidSpec | ErrorCode::Peel
    ) || e.class() == ErrorClass::Invalid
}
