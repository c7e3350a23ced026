//! Registry of served repositories.
//!
//! Built once at startup from [`Config`](crate::config::Config) and only read
//! afterwards, so it can be shared between request threads without locking.

mod repo_list;

pub use repo_list::RepoList;
