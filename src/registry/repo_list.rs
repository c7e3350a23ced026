//! Name-to-repository lookup.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::storage::{Repo, StorageError, StorageResult};

/// Repositories keyed by their URL-safe name.
#[derive(Debug, Default)]
pub struct RepoList {
    repos: BTreeMap<String, Repo>,
}

impl RepoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every repository the configuration names.
    ///
    /// Explicit paths must open. Entries of a scanned directory that aren't
    /// repositories are skipped. When two repositories share a name the first
    /// one registered wins.
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let mut list = Self::new();
        let limit = config.graph.max_commits;

        for path in &config.repositories.paths {
            list.insert(Repo::open(path)?.with_graph_limit(limit));
        }

        for dir in &config.repositories.scan_dirs {
            list.scan_dir(dir, limit)?;
        }

        tracing::info!(count = list.len(), "repository registry ready");
        Ok(list)
    }

    fn scan_dir(&mut self, dir: &Path, limit: Option<usize>) -> StorageResult<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        entries.sort();

        for path in entries {
            match Repo::open(&path) {
                Ok(repo) => {
                    self.insert(repo.with_graph_limit(limit));
                }
                Err(StorageError::NotARepository(_)) => {
                    tracing::debug!(path = %path.display(), "not a repository, skipping");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping repository that failed to open");
                }
            }
        }
        Ok(())
    }

    /// Register a repository. Returns false if the name was already taken.
    pub fn insert(&mut self, repo: Repo) -> bool {
        let key = repo.param().to_string();
        if self.repos.contains_key(&key) {
            tracing::warn!(name = %key, path = %repo.path().display(), "duplicate repository name, keeping the first");
            return false;
        }
        self.repos.insert(key, repo);
        true
    }

    /// Look a repository up by its URL-safe name.
    pub fn find(&self, param: &str) -> StorageResult<&Repo> {
        self.repos
            .get(param)
            .ok_or_else(|| StorageError::RepoNotFound(param.to_string()))
    }

    /// all repositories, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &Repo> {
        self.repos.values()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}
