//! Commit records and history traversal.
//!
//! Commits are read fresh from the backend on every call and never mutated.
//! Ref metadata is attached by composition: an [`AnnotatedCommit`] owns a
//! [`CommitInfo`] next to the refs that point at it, so a commit shared by
//! two listings can never pick up the other listing's refs.
//!
//! This module also holds the revwalk-backed history iterator used by the
//! git backend.

use chrono::{DateTime, Utc};
use git2::{Repository, Revwalk, Sort};
use serde::Serialize;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::refs::RefAnnotation;
use crate::storage::types::{CommitId, LogStart};

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub id: CommitId,
    /// Ordered; the first entry is the mainline parent.
    pub parent_ids: Vec<CommitId>,
    pub author_name: String,
    pub author_email: String,
    pub authored_time: DateTime<Utc>,
    pub message: String,
}

impl CommitInfo {
    /// Create a `CommitInfo` from a `git2::Commit`.
    ///
    /// Author and message bytes are decoded lossily so that a commit with a
    /// broken encoding still renders instead of failing the whole listing.
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let authored_time = clamp_timestamp(author.when().seconds());

        Self {
            id: CommitId::new(commit.id()),
            parent_ids: commit.parent_ids().map(CommitId::new).collect(),
            author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            authored_time,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        }
    }

    /// Check if this is a merge commit (has multiple parents).
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// Get the first (or only) parent.
    pub fn first_parent(&self) -> Option<CommitId> {
        self.parent_ids.first().copied()
    }

    /// Get a short summary of the commit (first line of message).
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }
}

/// Seconds since the epoch as a UTC instant, pinned to the representable range.
fn clamp_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_else(|| {
        tracing::warn!(seconds, "author time out of range, clamping");
        if seconds < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        }
    })
}

/// A commit together with the refs that point at it.
///
/// Always built through ref attachment, so `refs` is empty rather than
/// missing when nothing points at the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedCommit {
    #[serde(flatten)]
    pub commit: CommitInfo,
    pub refs: Vec<RefAnnotation>,
}

impl AnnotatedCommit {
    pub(crate) fn new(commit: CommitInfo, refs: Vec<RefAnnotation>) -> Self {
        Self { commit, refs }
    }

    pub fn id(&self) -> CommitId {
        self.commit.id
    }

    /// Short names of the attached refs, in enumeration order.
    pub fn ref_names(&self) -> Vec<&str> {
        self.refs.iter().map(|r| r.name.as_str()).collect()
    }

    /// Ref names joined by single spaces, `""` when there are none.
    pub fn ref_names_joined(&self) -> String {
        self.ref_names().join(" ")
    }
}

/// Iterate over commit history from one ref or from every ref.
///
/// Commits come out in topological order with ties broken by commit time,
/// newest first.
pub struct HistoryIterator<'repo> {
    repo: &'repo Repository,
    revwalk: Revwalk<'repo>,
}

impl<'repo> HistoryIterator<'repo> {
    /// Create a new history iterator.
    ///
    /// Fails with `InvalidCommit` when a single-ref start does not resolve
    /// and with `BackendUnavailable` when the lookup itself broke.
    pub fn new(repo: &'repo Repository, start: &LogStart) -> StorageResult<Self> {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        match start {
            LogStart::Ref(spec) => {
                let commit = repo
                    .revparse_single(spec)
                    .and_then(|object| object.peel_to_commit())
                    .map_err(|e| StorageError::from_lookup(e, spec.as_str()))?;
                revwalk.push(commit.id())?;
            }
            LogStart::All => {
                // globs skip refs that don't point at commits
                revwalk.push_glob("heads")?;
                revwalk.push_glob("remotes")?;
                revwalk.push_glob("tags")?;
                if repo.head_detached()? {
                    revwalk.push_head()?;
                }
            }
        }

        Ok(Self { repo, revwalk })
    }
}

impl<'repo> Iterator for HistoryIterator<'repo> {
    type Item = StorageResult<CommitInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.revwalk.next()? {
            Ok(oid) => match self.repo.find_commit(oid) {
                Ok(commit) => Some(Ok(CommitInfo::from_git2(&commit))),
                Err(e) => Some(Err(StorageError::BackendUnavailable(e))),
            },
            Err(e) => Some(Err(StorageError::BackendUnavailable(e))),
        }
    }
}

/// Get history from a start point.
pub fn history<'repo>(repo: &'repo Repository, start: &LogStart) -> StorageResult<HistoryIterator<'repo>> {
    HistoryIterator::new(repo, start)
}
