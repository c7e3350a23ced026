//! Commit-graph layout.
//!
//! Turns an ordered batch of annotated commits into nodes carrying a day
//! bucket and a lane, which is everything a client needs to draw the branch
//! and merge structure of a history window.
//!
//! ```ignore
//! use repoview::graph::{GraphIndexer, GraphView};
//!
//! let nodes = GraphIndexer::index(repo_commits);
//! let view = GraphView::new(nodes);
//! println!("{}", serde_json::to_string(&view)?);
//! ```

mod indexer;
mod lanes;

pub use indexer::{day_markers, DayMarker, GraphIndexer, GraphNode, GraphView, ParentEdge};
