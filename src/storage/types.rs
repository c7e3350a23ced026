//! core type-safe wrappers around git primitives for the storage layer.

use std::fmt;
use std::fmt::Formatter;

use git2::Oid;
use serde::{Serialize, Serializer};

/// Identifier of a commit object.
///
/// Opaque and stable: two commits are the same commit iff their ids are
/// equal. The inner Oid is only accessible within the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    /// raw Oid (for internal use only)
    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// parse CommitId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// what kind of named pointer a ref is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// `refs/heads/*`
    Branch,
    /// `refs/remotes/*`
    RemoteBranch,
    /// `refs/tags/*`
    Tag,
}

impl RefKind {
    /// classify a full ref name, `None` for namespaces the viewer ignores
    pub fn from_ref_name(full_name: &str) -> Option<Self> {
        if full_name.starts_with("refs/heads/") {
            Some(RefKind::Branch)
        } else if full_name.starts_with("refs/remotes/") {
            Some(RefKind::RemoteBranch)
        } else if full_name.starts_with("refs/tags/") {
            Some(RefKind::Tag)
        } else {
            None
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Branch => write!(f, "branch"),
            RefKind::RemoteBranch => write!(f, "remote branch"),
            RefKind::Tag => write!(f, "tag"),
        }
    }
}

/// where a history traversal starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStart {
    /// a single commit id or symbolic ref name
    Ref(String),
    /// every branch, remote branch and tag, plus HEAD (like `git log --all`)
    All,
}

impl LogStart {
    /// traversal from one ref
    pub fn reference(name: impl Into<String>) -> Self {
        LogStart::Ref(name.into())
    }
}

impl fmt::Display for LogStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogStart::Ref(name) => write!(f, "{}", name),
            LogStart::All => write!(f, "--all"),
        }
    }
}
