//!   Repository accessor.
//!
//!  [`Repo`] wraps one repository behind a [`VcsBackend`]. It resolves
//!  identifiers to commits, attaches ref annotations, and exposes bounded
//!  commit listings for log and graph views. Every call reads fresh from the
//!  backend; the only cache is the [`RefCache`] scoped to a single call.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::graph::{GraphIndexer, GraphNode, GraphView};
use crate::storage::backend::{GitBackend, VcsBackend};
use crate::storage::commit::{AnnotatedCommit, CommitInfo};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::refs::RefCache;
use crate::storage::types::LogStart;

/// branch listed when HEAD doesn't name one
pub const DEFAULT_BRANCH: &str = "master";

/// page size used when the caller has no preference
pub const DEFAULT_MAX_COUNT: i64 = 10;

/// git writes this into `description` for new repositories
const PLACEHOLDER_DESCRIPTION: &str = "Unnamed repository;";

/// A named, read-only view over one repository.
pub struct Repo<B: VcsBackend = GitBackend> {
    name: String,
    param: String,
    description: String,
    path: PathBuf,
    graph_limit: Option<usize>,
    backend: B,
}

impl Repo<GitBackend> {
    /// Open the git repository at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let backend = GitBackend::open(path)?;
        Self::with_backend(path, backend)
    }
}

impl<B: VcsBackend> Repo<B> {
    /// Wrap an already-open backend. `path` names the repository.
    pub fn with_backend(path: impl AsRef<Path>, backend: B) -> StorageResult<Self> {
        let path = path.as_ref();
        let param = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let description = backend
            .description()?
            .filter(|text| !text.starts_with(PLACEHOLDER_DESCRIPTION))
            .unwrap_or_default();

        Ok(Self {
            name: param.clone(),
            param,
            description,
            path: path.to_path_buf(),
            graph_limit: None,
            backend,
        })
    }

    /// Cap the number of commits a graph listing may walk.
    pub fn with_graph_limit(mut self, limit: Option<usize>) -> Self {
        self.graph_limit = limit;
        self
    }

    /// display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL-safe name
    pub fn param(&self) -> &str {
        &self.param
    }

    /// empty when the repository has no description of its own
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn graph_limit(&self) -> Option<usize> {
        self.graph_limit
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The branch HEAD points at, or [`DEFAULT_BRANCH`] when HEAD is detached.
    pub fn default_branch(&self) -> StorageResult<String> {
        Ok(self
            .backend
            .head_branch()?
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()))
    }

    // ==================== Commit lookup ====================

    /// Look up a commit by id or ref name, with its refs attached.
    pub fn resolve_commit(&self, id_or_ref: &str) -> StorageResult<AnnotatedCommit> {
        let commit = self
            .backend
            .get_commit(id_or_ref)?
            .ok_or_else(|| StorageError::invalid_commit(id_or_ref))?;

        let mut cache = RefCache::new();
        self.attach_refs(commit, &mut cache)
    }

    /// Pair a commit with the refs pointing at it.
    ///
    /// Fills `cache` with one scan of the repository's refs the first time it
    /// is used; later calls sharing the cache only do a map lookup.
    pub fn attach_refs(&self, commit: CommitInfo, cache: &mut RefCache) -> StorageResult<AnnotatedCommit> {
        cache.populate_with(|| self.backend.enumerate_refs())?;
        let refs = cache.refs_for(&commit.id).to_vec();
        Ok(AnnotatedCommit::new(commit, refs))
    }

    // ==================== Listings ====================

    /// Up to `max_count` commits reachable from `start`, newest first, after
    /// skipping `skip`.
    pub fn commits(&self, start: &str, max_count: i64, skip: usize) -> StorageResult<Vec<AnnotatedCommit>> {
        let max_count = validate_max_count(max_count)?;
        let raw = self.backend.log(&LogStart::reference(start), max_count, skip)?;
        self.annotate(raw)
    }

    /// The first page of the default branch.
    pub fn recent_commits(&self) -> StorageResult<Vec<AnnotatedCommit>> {
        let branch = self.default_branch()?;
        self.commits(&branch, DEFAULT_MAX_COUNT, 0)
    }

    /// Like [`Repo::commits`] over every ref's history, laid out as a graph.
    ///
    /// `max_count` is clamped to the configured graph limit before the
    /// traversal starts.
    pub fn all_commits(&self, max_count: i64, skip: usize) -> StorageResult<Vec<GraphNode>> {
        let requested = validate_max_count(max_count)?;
        let max_count = match self.graph_limit {
            Some(limit) if requested > limit => {
                tracing::debug!(repo = %self.param, requested, limit, "clamping graph window");
                limit
            }
            _ => requested,
        };

        let raw = self.backend.log(&LogStart::All, max_count, skip)?;
        let annotated = self.annotate(raw)?;
        Ok(GraphIndexer::index(annotated))
    }

    /// [`Repo::all_commits`] bundled with its day markers.
    pub fn graph(&self, max_count: i64, skip: usize) -> StorageResult<GraphView> {
        Ok(GraphView::new(self.all_commits(max_count, skip)?))
    }

    /// One page of `start`'s history. Pages are numbered from 1.
    pub fn page(&self, start: &str, page: usize, per_page: usize) -> StorageResult<CommitPage> {
        if page == 0 {
            return Err(StorageError::invalid_argument("page", "page numbers start at 1"));
        }
        if per_page == 0 {
            return Err(StorageError::invalid_argument("per_page", "per_page must be at least 1"));
        }
        let skip = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| StorageError::invalid_argument("page", format!("page {} is out of range", page)))?;

        // one extra commit tells us whether a next page exists
        let mut raw = self
            .backend
            .log(&LogStart::reference(start), per_page.saturating_add(1), skip)?;
        let has_next = raw.len() > per_page;
        raw.truncate(per_page);

        Ok(CommitPage {
            commits: self.annotate(raw)?,
            page,
            per_page,
            has_next,
            has_previous: page > 1,
        })
    }

    /// attach refs to a whole listing through one shared cache
    fn annotate(&self, commits: Vec<CommitInfo>) -> StorageResult<Vec<AnnotatedCommit>> {
        let mut cache = RefCache::new();
        commits
            .into_iter()
            .map(|commit| self.attach_refs(commit, &mut cache))
            .collect()
    }
}

fn validate_max_count(max_count: i64) -> StorageResult<usize> {
    if max_count < 0 {
        return Err(StorageError::invalid_argument(
            "max_count",
            "max_count cannot be less than 0",
        ));
    }
    Ok(usize::try_from(max_count).unwrap_or(usize::MAX))
}

impl<B: VcsBackend> PartialEq for Repo<B> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<B: VcsBackend> fmt::Display for Repo<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<B: VcsBackend> fmt::Debug for Repo<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("graph_limit", &self.graph_limit)
            .finish_non_exhaustive()
    }
}

/// One page of a branch's history.
#[derive(Debug, Clone, Serialize)]
pub struct CommitPage {
    pub commits: Vec<AnnotatedCommit>,
    pub page: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixture::FixtureRepo;
    use crate::storage::types::CommitId;

    fn setup(count: usize) -> (FixtureRepo, Repo, Vec<CommitId>) {
        let fixture = FixtureRepo::new();
        let ids = fixture.chain(count, 1_300_000_000);
        fixture.branch("master", *ids.last().unwrap());
        let repo = Repo::open(fixture.path()).unwrap();
        (fixture, repo, ids)
    }

    #[test]
    fn test_identity() {
        let (fixture, repo, _) = setup(1);
        let expected = fixture.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(repo.name(), expected);
        assert_eq!(repo.param(), expected);
        assert_eq!(repo.to_string(), expected);
        assert_eq!(repo.default_branch().unwrap(), "master");

        let again = Repo::open(fixture.path()).unwrap();
        assert_eq!(repo, again);
    }

    #[test]
    fn test_description() {
        let fixture = FixtureRepo::new();
        fixture.set_description("Unnamed repository; edit this file 'description' to name the repository.\n");
        assert_eq!(Repo::open(fixture.path()).unwrap().description(), "");

        fixture.set_description("The test repository\n");
        assert_eq!(Repo::open(fixture.path()).unwrap().description(), "The test repository");
    }

    #[test]
    fn test_resolve_commit_by_id_and_ref() {
        let (_fixture, repo, ids) = setup(3);

        let by_id = repo.resolve_commit(&ids[0].to_string()).unwrap();
        assert_eq!(by_id.id(), ids[0]);
        assert!(by_id.refs.is_empty());

        let by_ref = repo.resolve_commit("master").unwrap();
        assert_eq!(by_ref.id(), ids[2]);
        assert_eq!(by_ref.ref_names(), vec!["master"]);
    }

    #[test]
    fn test_resolve_invalid_commit() {
        let (_fixture, repo, _) = setup(1);
        let err = repo.resolve_commit("totallyinvalid").unwrap_err();
        assert!(matches!(err, StorageError::InvalidCommit { ref id } if id == "totallyinvalid"));
        assert!(err.to_string().contains("totallyinvalid"));
    }

    #[test]
    fn test_tag_attachment() {
        let fixture = FixtureRepo::new();
        let ids = fixture.chain(2, 1_300_000_000);
        fixture.tag("v1", ids[0]);
        let repo = Repo::open(fixture.path()).unwrap();

        let tagged = repo.resolve_commit(&ids[0].to_string()).unwrap();
        assert_eq!(tagged.ref_names(), vec!["v1"]);

        let untagged = repo.resolve_commit(&ids[1].to_string()).unwrap();
        assert!(untagged.refs.is_empty());
    }

    #[test]
    fn test_attach_refs_idempotent() {
        let (fixture, repo, ids) = setup(2);
        fixture.tag("v1", ids[1]);
        let commit = repo.backend().get_commit("master").unwrap().unwrap();

        let mut cache = RefCache::new();
        let first = repo.attach_refs(commit.clone(), &mut cache).unwrap();
        let second = repo.attach_refs(commit, &mut cache).unwrap();

        assert_eq!(first.refs, second.refs);
        assert_eq!(second.ref_names(), vec!["master", "v1"]);
    }

    #[test]
    fn test_commits_default_page() {
        let (_fixture, repo, ids) = setup(12);

        let commits = repo.recent_commits().unwrap();
        assert_eq!(commits.len(), 10);
        assert_eq!(commits[0].id(), ids[11]);
        assert_eq!(commits[0].ref_names(), vec!["master"]);
        assert!(commits[1..].iter().all(|c| c.refs.is_empty()));
    }

    #[test]
    fn test_commits_bounds() {
        let (_fixture, repo, ids) = setup(5);

        for max_count in 0..7 {
            for skip in 0..7 {
                let commits = repo.commits("master", max_count, skip).unwrap();
                assert!(commits.len() <= max_count as usize);
                assert_eq!(commits.len(), (max_count as usize).min(5usize.saturating_sub(skip)));
            }
        }

        let page = repo.commits("master", 2, 1).unwrap();
        let page_ids: Vec<_> = page.iter().map(|c| c.id()).collect();
        assert_eq!(page_ids, vec![ids[3], ids[2]]);
    }

    #[test]
    fn test_commits_negative_max_count() {
        let (_fixture, repo, _) = setup(3);
        for skip in [0, 1, 100] {
            let err = repo.commits("master", -1, skip).unwrap_err();
            assert!(err.is_caller_error());
            assert!(err.to_string().contains("max_count cannot be less than 0"));
        }
        assert!(matches!(repo.all_commits(-5, 0), Err(StorageError::InvalidArgument { .. })));
    }

    #[test]
    fn test_commits_unknown_start() {
        let (_fixture, repo, _) = setup(1);
        let err = repo.commits("no-such-branch", 10, 0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidCommit { ref id } if id == "no-such-branch"));
    }

    #[test]
    fn test_all_commits_spans_branches() {
        let fixture = FixtureRepo::new();
        let day = 86_400;
        let base = fixture.commit("Base", &[], 1_300_060_800);
        let side = fixture.commit("Side", &[base], 1_300_060_800 + day);
        let main = fixture.commit("Main", &[base], 1_300_060_800 + day + 60);
        let merge = fixture.commit("Merge", &[main, side], 1_300_060_800 + 2 * day);
        let topic = fixture.commit("Topic", &[merge], 1_300_060_800 + 3 * day);
        fixture.branch("master", merge);
        fixture.branch("topic", topic);
        fixture.tag("v1", base);
        let repo = Repo::open(fixture.path()).unwrap();

        let nodes = repo.all_commits(650, 0).unwrap();
        let order: Vec<_> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(order.len(), 5);
        assert_eq!(&order[..2], &[topic, merge]);
        assert_eq!(order[4], base);

        // the two sides of the merge may come out in either order
        let lane_of = |id: CommitId| nodes.iter().find(|n| n.id() == id).unwrap().lane;
        assert_eq!(lane_of(topic), 0);
        assert_eq!(lane_of(merge), 0);
        assert_eq!(lane_of(main), 0);
        assert_eq!(lane_of(side), 1);
        assert!(lane_of(base) <= 1);

        let days: Vec<_> = nodes.iter().map(|n| n.day_index).collect();
        assert_eq!(days, vec![0, 1, 2, 2, 3]);

        assert_eq!(nodes[0].commit.ref_names(), vec!["topic"]);
        assert_eq!(nodes[1].commit.ref_names(), vec!["master"]);
        assert_eq!(nodes[4].commit.ref_names(), vec!["v1"]);
        assert_eq!(nodes[1].edges.len(), 2);
    }

    #[test]
    fn test_all_commits_window() {
        let (_fixture, repo, ids) = setup(6);

        let nodes = repo.all_commits(2, 1).unwrap();
        let order: Vec<_> = nodes.iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![ids[4], ids[3]]);
        // ids[2] is outside the window, so the last node has no edge
        assert!(nodes[1].edges.is_empty());

        assert!(repo.all_commits(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_graph_limit_clamps() {
        let (fixture, _repo, _) = setup(8);
        let repo = Repo::open(fixture.path()).unwrap().with_graph_limit(Some(3));

        assert_eq!(repo.all_commits(650, 0).unwrap().len(), 3);
        assert_eq!(repo.all_commits(2, 0).unwrap().len(), 2);
        // the cap applies to graph views only
        assert_eq!(repo.commits("master", 8, 0).unwrap().len(), 8);
    }

    #[test]
    fn test_graph_view() {
        let (_fixture, repo, _) = setup(3);
        let view = repo.graph(10, 0).unwrap();
        assert_eq!(view.commits.len(), 3);
        assert_eq!(view.width, 1);
        assert_eq!(view.days.len(), 1); // one hour apart, same day

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["commits"].as_array().unwrap().len(), 3);
        assert_eq!(json["commits"][0]["refs"], "master");
    }

    #[test]
    fn test_pagination() {
        let (_fixture, repo, ids) = setup(25);

        let first = repo.page("master", 1, 10).unwrap();
        assert_eq!(first.commits.len(), 10);
        assert_eq!(first.commits[0].id(), ids[24]);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let last = repo.page("master", 3, 10).unwrap();
        assert_eq!(last.commits.len(), 5);
        assert_eq!(last.commits[4].id(), ids[0]);
        assert!(!last.has_next);
        assert!(last.has_previous);

        let exact = repo.page("master", 5, 5).unwrap();
        assert_eq!(exact.commits.len(), 5);
        assert!(!exact.has_next);

        let beyond = repo.page("master", 9, 10).unwrap();
        assert!(beyond.commits.is_empty());
        assert!(!beyond.has_next);
    }

    #[test]
    fn test_pagination_rejects_zero() {
        let (_fixture, repo, _) = setup(2);
        assert!(repo.page("master", 0, 10).unwrap_err().is_caller_error());
        assert!(repo.page("master", 1, 0).unwrap_err().is_caller_error());
    }

    #[test]
    fn test_repo_is_shareable_across_threads() {
        let (_fixture, repo, _) = setup(4);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| repo.commits("master", 10, 0).unwrap().len()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), 4);
            }
        });
    }
}
