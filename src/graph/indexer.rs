//! Day buckets and lane layout for a commit-graph view.
//!
//! Input is a batch of commits in traversal order (children before parents,
//! newest first). Each commit gets a `day_index` that increases by one every
//! time the UTC calendar date changes between consecutive commits, and a
//! `lane` chosen as follows:
//!
//! - a commit inherits the lane its child reserved for it; a commit nobody
//!   reserved (a branch tip entering the window) takes the smallest free lane;
//! - a commit hands its own lane to its first parent unless another child got
//!   there first, keeping mainlines straight;
//! - every other parent without a reservation gets the smallest free lane;
//! - a lane no longer handed down returns to the pool.
//!
//! Parents outside the batch get no reservation and no edge. They still show
//! up in the serialized `parent_ids`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::graph::lanes::LaneState;
use crate::storage::{AnnotatedCommit, CommitId};

/// An edge from a node to one of its parents inside the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParentEdge {
    pub id: CommitId,
    /// lane the parent is drawn on
    pub lane: usize,
}

/// One commit placed on the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub commit: AnnotatedCommit,
    pub day_index: usize,
    pub lane: usize,
    /// in-batch parents, in `parent_ids` order
    pub edges: Vec<ParentEdge>,
}

impl GraphNode {
    pub fn id(&self) -> CommitId {
        self.commit.id()
    }

    pub fn authored_date(&self) -> NaiveDate {
        self.commit.commit.authored_time.date_naive()
    }
}

impl Serialize for GraphNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let commit = &self.commit.commit;
        let mut state = serializer.serialize_struct("GraphNode", 11)?;
        state.serialize_field("id", &commit.id)?;
        // every parent, including the ones the window cut off
        state.serialize_field("parent_ids", &commit.parent_ids)?;
        state.serialize_field("parents", &self.edges)?;
        state.serialize_field("author_name", &commit.author_name)?;
        state.serialize_field("author_email", &commit.author_email)?;
        state.serialize_field("authored_time", &commit.authored_time)?;
        state.serialize_field("time", &commit.authored_time.timestamp())?;
        state.serialize_field("message", &commit.message)?;
        state.serialize_field("refs", &self.commit.ref_names_joined())?;
        state.serialize_field("day_index", &self.day_index)?;
        state.serialize_field("lane", &self.lane)?;
        state.end()
    }
}

/// The calendar date behind one day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayMarker {
    pub day_index: usize,
    pub date: NaiveDate,
    /// day of month, 1-based
    pub day: u32,
    /// abbreviated month name, e.g. `Jan`
    pub month: String,
}

/// Indexed nodes plus the day list a renderer draws separators from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphView {
    pub days: Vec<DayMarker>,
    pub commits: Vec<GraphNode>,
    /// number of lanes needed to draw every node and edge
    pub width: usize,
}

impl GraphView {
    pub fn new(commits: Vec<GraphNode>) -> Self {
        let days = day_markers(&commits);
        let width = commits
            .iter()
            .flat_map(|node| std::iter::once(node.lane).chain(node.edges.iter().map(|e| e.lane)))
            .map(|lane| lane + 1)
            .max()
            .unwrap_or(0);
        Self { days, commits, width }
    }
}

/// Assigns days and lanes to an ordered batch of commits.
pub struct GraphIndexer;

impl GraphIndexer {
    /// Index a batch. Output has the input's length and order.
    ///
    /// Pure function of the input sequence: indexing the same sequence twice
    /// gives the same days and lanes.
    pub fn index(commits: impl IntoIterator<Item = AnnotatedCommit>) -> Vec<GraphNode> {
        let commits: Vec<AnnotatedCommit> = commits.into_iter().collect();
        let window: HashSet<CommitId> = commits.iter().map(AnnotatedCommit::id).collect();

        let mut lanes = LaneState::new();
        let mut placed: HashMap<CommitId, usize> = HashMap::with_capacity(commits.len());
        let mut days = DayCounter::default();
        let mut nodes = Vec::with_capacity(commits.len());

        for commit in commits {
            let id = commit.id();
            let day_index = days.advance(commit.commit.authored_time);
            let lane = lanes.take_or_allocate(&id);
            placed.insert(id, lane);

            let mut edges = Vec::with_capacity(commit.commit.parent_ids.len());
            let mut handed_down = false;

            for (position, parent) in commit.commit.parent_ids.iter().enumerate() {
                if !window.contains(parent) {
                    continue;
                }

                let parent_lane = if let Some(&drawn) = placed.get(parent) {
                    // parent came first in the batch; point at where it already is
                    drawn
                } else if let Some(reserved) = lanes.reservation(parent) {
                    reserved
                } else if position == 0 && !handed_down {
                    lanes.reserve(*parent, lane);
                    handed_down = true;
                    lane
                } else {
                    let fresh = lanes.allocate();
                    lanes.reserve(*parent, fresh);
                    fresh
                };

                edges.push(ParentEdge {
                    id: *parent,
                    lane: parent_lane,
                });
            }

            if !handed_down {
                lanes.release(lane);
            }

            nodes.push(GraphNode {
                commit,
                day_index,
                lane,
                edges,
            });
        }

        tracing::debug!(
            commits = nodes.len(),
            days = days.count(),
            lanes = lanes.width(),
            dangling = lanes.pending(),
            "indexed commit graph"
        );
        nodes
    }
}

/// Day bucket per commit, one bucket per run of equal UTC dates.
#[derive(Debug, Default)]
struct DayCounter {
    previous: Option<NaiveDate>,
    index: usize,
}

impl DayCounter {
    fn advance(&mut self, time: DateTime<Utc>) -> usize {
        let date = time.date_naive();
        if let Some(previous) = self.previous {
            if previous != date {
                self.index += 1;
            }
        }
        self.previous = Some(date);
        self.index
    }

    fn count(&self) -> usize {
        if self.previous.is_some() {
            self.index + 1
        } else {
            0
        }
    }
}

/// One marker per day bucket, in bucket order.
pub fn day_markers(nodes: &[GraphNode]) -> Vec<DayMarker> {
    let mut markers: Vec<DayMarker> = Vec::new();
    for node in nodes {
        if markers.last().is_some_and(|m| m.day_index == node.day_index) {
            continue;
        }
        let date = node.authored_date();
        markers.push(DayMarker {
            day_index: node.day_index,
            date,
            day: chrono::Datelike::day(&date),
            month: date.format("%b").to_string(),
        });
    }
    markers
}
