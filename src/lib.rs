//! repoview - a read-only Git repository viewer
//!
//! This crate provides the core of a repository browser: commit lookup with
//! branch and tag annotations, paginated history listings, and a lane layout
//! engine that turns a window of history into a drawable commit graph.
//!
//! # Example
//!
//! ```no_run
//! use repoview::storage::Repo;
//!
//! let repo = Repo::open("./my_project").unwrap();
//! for commit in repo.commits("master", 10, 0).unwrap() {
//!     println!("{} {}", commit.id().short(), commit.commit.summary());
//! }
//!
//! let graph = repo.graph(650, 0).unwrap();
//! println!("{}", serde_json::to_string(&graph).unwrap());
//! ```

pub mod config;
pub mod graph;
pub mod registry;
pub mod storage;
