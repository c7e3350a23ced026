//!  Reference enumeration and the per-request ref cache.
//!
//!  Git refs are named pointers to commits. The viewer shows them next to
//!  the commits they point at. Looking refs up one commit at a time would cost
//!  O(refs) per commit, so a listing builds a [`RefCache`] with one scan of
//!  the repository's refs and answers every later lookup from it.
//!
//! Only branches, remote-tracking branches and tags are considered.

use std::collections::HashMap;

use git2::{ReferenceType, Repository};
use serde::Serialize;

use crate::storage::error::StorageResult;
use crate::storage::types::{CommitId, RefKind};

/// A named pointer (branch or tag) and the commit it currently targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RefAnnotation {
    /// short name, e.g. `master`, `origin/master`, `v1`
    pub name: String,
    pub kind: RefKind,
    pub commit_id: CommitId,
}

impl RefAnnotation {
    pub fn new(name: impl Into<String>, kind: RefKind, commit_id: CommitId) -> Self {
        Self {
            name: name.into(),
            kind,
            commit_id,
        }
    }
}

/// Reads refs out of a git repository.
pub struct RefManager;

impl RefManager {
    /// List every branch, remote branch and tag with the commit it peels to.
    ///
    /// Sorted by full ref name so repeated scans of the same repository state
    /// yield the same order. Symbolic refs (such as `origin/HEAD`) and refs
    /// that don't peel to a commit are skipped.
    pub fn list_refs(repo: &Repository) -> StorageResult<Vec<RefAnnotation>> {
        let mut found = Vec::new();

        for reference in repo.references()? {
            let reference = reference?;
            if reference.kind() == Some(ReferenceType::Symbolic) {
                continue;
            }

            let full_name = String::from_utf8_lossy(reference.name_bytes()).into_owned();
            let Some(kind) = RefKind::from_ref_name(&full_name) else {
                continue;
            };

            let commit = match reference.peel_to_commit() {
                Ok(commit) => commit,
                Err(e) => {
                    tracing::warn!(reference = %full_name, error = %e, "skipping ref that does not point at a commit");
                    continue;
                }
            };

            let short = String::from_utf8_lossy(reference.shorthand_bytes()).into_owned();
            found.push((full_name, RefAnnotation::new(short, kind, CommitId::new(commit.id()))));
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found.into_iter().map(|(_, annotation)| annotation).collect())
    }

    /// The short name of the branch HEAD points at, if HEAD is symbolic.
    ///
    /// Works for unborn branches too, which is the state of a fresh repository.
    pub fn head_branch(repo: &Repository) -> StorageResult<Option<String>> {
        let head = match repo.find_reference("HEAD") {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(str::to_string))
    }
}

/// Commit id to the refs pointing at it, built once per logical request.
///
/// The cache is empty until its first lookup; [`RefCache::is_populated`]
/// then stays true even for a repository without any refs, so a ref-less
/// repository is scanned once rather than once per commit.
#[derive(Debug, Default, Clone)]
pub struct RefCache {
    entries: Option<HashMap<CommitId, Vec<RefAnnotation>>>,
}

impl RefCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// has the single ref scan happened yet
    pub fn is_populated(&self) -> bool {
        self.entries.is_some()
    }

    /// Fill the cache from a full ref listing. No-op when already populated.
    pub fn populate_with<F>(&mut self, scan: F) -> StorageResult<()>
    where
        F: FnOnce() -> StorageResult<Vec<RefAnnotation>>,
    {
        if self.entries.is_some() {
            return Ok(());
        }

        let mut entries: HashMap<CommitId, Vec<RefAnnotation>> = HashMap::new();
        for annotation in scan()? {
            let refs = entries.entry(annotation.commit_id).or_default();
            let seen = refs
                .iter()
                .any(|existing| existing.name == annotation.name && existing.kind == annotation.kind);
            if !seen {
                refs.push(annotation);
            }
        }

        tracing::debug!(commits = entries.len(), "populated ref cache");
        self.entries = Some(entries);
        Ok(())
    }

    /// refs targeting `id`, empty when none (or when not yet populated)
    pub fn refs_for(&self, id: &CommitId) -> &[RefAnnotation] {
        self.entries
            .as_ref()
            .and_then(|entries| entries.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// number of distinct commits that have at least one ref
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
