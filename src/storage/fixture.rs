//! Test fixture: a scratch git repository with hand-placed commits and refs.

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

use crate::storage::types::CommitId;

pub(crate) struct FixtureRepo {
    repo: Repository,
    empty_tree: Oid,
    dir: TempDir,
}

impl FixtureRepo {
    pub const AUTHOR_NAME: &'static str = "Test Author";
    pub const AUTHOR_EMAIL: &'static str = "author@example.com";

    /// a fresh repository whose HEAD points at the (unborn) `master` branch
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/master").unwrap();
        let empty_tree = repo.treebuilder(None).unwrap().write().unwrap();
        Self { repo, empty_tree, dir }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// path of the working directory (what a user would pass to open)
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// write a commit authored at `time` (unix seconds, UTC) without moving any ref
    pub fn commit(&self, message: &str, parents: &[CommitId], time: i64) -> CommitId {
        self.commit_as(Self::AUTHOR_NAME, Self::AUTHOR_EMAIL, message, parents, time)
    }

    pub fn commit_as(&self, name: &str, email: &str, message: &str, parents: &[CommitId], time: i64) -> CommitId {
        let sig = Signature::new(name, email, &Time::new(time, 0)).unwrap();
        let tree = self.repo.find_tree(self.empty_tree).unwrap();
        let parent_commits: Vec<_> = parents
            .iter()
            .map(|id| self.repo.find_commit(id.raw()).unwrap())
            .collect();
        let parent_refs: Vec<_> = parent_commits.iter().collect();

        let oid = self.repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap();
        CommitId::new(oid)
    }

    /// a linear chain of `count` commits, one hour apart, oldest first
    pub fn chain(&self, count: usize, start_time: i64) -> Vec<CommitId> {
        let mut ids: Vec<CommitId> = Vec::with_capacity(count);
        for i in 0..count {
            let parents: Vec<CommitId> = ids.last().copied().into_iter().collect();
            let id = self.commit(&format!("Commit {}", i + 1), &parents, start_time + i as i64 * 3600);
            ids.push(id);
        }
        ids
    }

    pub fn branch(&self, name: &str, target: CommitId) {
        self.repo
            .reference(&format!("refs/heads/{}", name), target.raw(), true, "fixture branch")
            .unwrap();
    }

    pub fn remote_branch(&self, remote: &str, name: &str, target: CommitId) {
        self.repo
            .reference(&format!("refs/remotes/{}/{}", remote, name), target.raw(), true, "fixture remote")
            .unwrap();
    }

    /// lightweight tag
    pub fn tag(&self, name: &str, target: CommitId) {
        self.repo
            .reference(&format!("refs/tags/{}", name), target.raw(), true, "fixture tag")
            .unwrap();
    }

    pub fn annotated_tag(&self, name: &str, target: CommitId) {
        let sig = Signature::new(Self::AUTHOR_NAME, Self::AUTHOR_EMAIL, &Time::new(0, 0)).unwrap();
        let object = self.repo.find_object(target.raw(), None).unwrap();
        self.repo.tag(name, &object, &sig, "fixture annotated tag", true).unwrap();
    }

    pub fn set_description(&self, text: &str) {
        std::fs::write(self.repo.path().join("description"), text).unwrap();
    }
}
