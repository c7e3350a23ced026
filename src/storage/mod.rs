//! repository access layer for repoview
//!
//! this module is the only part of the crate that talks to git. Everything
//! above it (graph layout, registry, front end) goes through [`Repo`] and the
//! [`VcsBackend`] contract and never touches git2 directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Repo                               │
//! │  (resolve_commit, commits, all_commits, page, attach_refs)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │  VcsBackend (trait) │
//!                   └─────────────────────┘
//!                              │
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │     GitBackend      │
//!                   └─────────────────────┘
//!        ┌─────────────────────┴─────────────────────┐
//!        ▼                                           ▼
//!  ┌─────────────┐                             ┌─────────────┐
//!  │   commit    │                             │    refs     │
//!  │  (history)  │                             │ (branches,  │
//!  └─────────────┘                             │   tags)     │
//!                                              └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use repoview::storage::Repo;
//!
//! let repo = Repo::open("./my_project")?;
//!
//! // A single commit, with the branches and tags pointing at it
//! let head = repo.resolve_commit("master")?;
//! println!("{} {}", head.id().short(), head.ref_names_joined());
//!
//! // Ten commits of master, skipping the first twenty
//! let commits = repo.commits("master", 10, 20)?;
//!
//! // Every branch, laid out for a graph view
//! let nodes = repo.all_commits(650, 0)?;
//! ```

mod backend;
mod commit;
mod error;
mod refs;
mod repository;
mod types;

#[cfg(test)]
pub(crate) mod fixture;

// Re-export public API
pub use backend::{GitBackend, VcsBackend};
pub use commit::{AnnotatedCommit, CommitInfo, HistoryIterator};
pub use error::{StorageError, StorageResult};
pub use refs::{RefAnnotation, RefCache, RefManager};
pub use repository::{CommitPage, Repo, DEFAULT_BRANCH, DEFAULT_MAX_COUNT};
pub use types::{CommitId, LogStart, RefKind};
