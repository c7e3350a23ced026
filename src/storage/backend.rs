//! The read-only contract between the viewer and a version-control backend.
//!
//! [`VcsBackend`] names every primitive the accessor layer uses; nothing
//! reaches the underlying library any other way. [`GitBackend`] implements it
//! over libgit2.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use git2::Repository;
use parking_lot::Mutex;

use crate::storage::commit::{self, CommitInfo};
use crate::storage::error::{is_lookup_miss, StorageError, StorageResult};
use crate::storage::refs::{RefAnnotation, RefManager};
use crate::storage::types::{CommitId, LogStart};

/// Read primitives a repository backend must provide.
///
/// Implementations must be safe to call from several request threads at
/// once and must never mutate repository state.
pub trait VcsBackend: Send + Sync {
    /// Look a commit up by exact id, abbreviated id or symbolic ref name.
    ///
    /// `Ok(None)` when nothing matches; `Err` only when the backend itself
    /// failed.
    fn get_commit(&self, spec: &str) -> StorageResult<Option<CommitInfo>>;

    /// immediate parents of a commit, mainline parent first
    fn parent_ids(&self, id: CommitId) -> StorageResult<Vec<CommitId>>;

    /// every ref with the commit it targets, in a stable order
    fn enumerate_refs(&self) -> StorageResult<Vec<RefAnnotation>>;

    /// Up to `max_count` commits reachable from `start`, newest first,
    /// after dropping the first `skip`.
    fn log(&self, start: &LogStart, max_count: usize, skip: usize) -> StorageResult<Vec<CommitInfo>>;

    /// free-form repository description, if the repository has one
    fn description(&self) -> StorageResult<Option<String>>;

    /// short name of the branch HEAD points at, `None` when detached
    fn head_branch(&self) -> StorageResult<Option<String>>;
}

/// [`VcsBackend`] over a git repository on disk.
///
/// The handle sits behind a mutex because `git2::Repository` may move
/// between threads but not be used from two at once.
pub struct GitBackend {
    repo: Mutex<Repository>,
    path: PathBuf,
}

impl GitBackend {
    /// Open an existing repository (bare or with a working directory).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| StorageError::NotARepository(path.to_path_buf()))?;
        tracing::info!(path = %path.display(), bare = repo.is_bare(), "opened repository");

        Ok(Self {
            repo: Mutex::new(repo),
            path: path.to_path_buf(),
        })
    }

    /// Get the repository path as it was given to `open`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a function with exclusive access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Repository) -> StorageResult<T>,
    {
        let repo = self.repo.lock();
        f(&repo)
    }
}

impl VcsBackend for GitBackend {
    fn get_commit(&self, spec: &str) -> StorageResult<Option<CommitInfo>> {
        self.with_repo(|repo| {
            let found = repo.revparse_single(spec).and_then(|object| object.peel_to_commit());
            match found {
                Ok(commit) => Ok(Some(CommitInfo::from_git2(&commit))),
                Err(e) if is_lookup_miss(&e) => {
                    tracing::debug!(spec, error = %e, "commit lookup missed");
                    Ok(None)
                }
                Err(e) => Err(StorageError::BackendUnavailable(e)),
            }
        })
    }

    fn parent_ids(&self, id: CommitId) -> StorageResult<Vec<CommitId>> {
        self.with_repo(|repo| {
            let commit = repo
                .find_commit(id.raw())
                .map_err(|e| StorageError::from_lookup(e, id.to_string()))?;
            Ok(commit.parent_ids().map(CommitId::new).collect())
        })
    }

    fn enumerate_refs(&self) -> StorageResult<Vec<RefAnnotation>> {
        self.with_repo(RefManager::list_refs)
    }

    fn log(&self, start: &LogStart, max_count: usize, skip: usize) -> StorageResult<Vec<CommitInfo>> {
        self.with_repo(|repo| {
            let commits: Vec<CommitInfo> = commit::history(repo, start)?
                .skip(skip)
                .take(max_count)
                .collect::<Result<_, _>>()?;
            tracing::debug!(%start, max_count, skip, returned = commits.len(), "walked history");
            Ok(commits)
        })
    }

    fn description(&self) -> StorageResult<Option<String>> {
        self.with_repo(|repo| match std::fs::read_to_string(repo.path().join("description")) {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    fn head_branch(&self) -> StorageResult<Option<String>> {
        self.with_repo(RefManager::head_branch)
    }
}
