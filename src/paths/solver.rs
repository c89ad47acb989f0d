//! Incremental Dijkstra.
//!
//! [`ShortestPaths`] keeps its search state between calls: each
//! [`extend_search`](ShortestPaths::extend_search) settles at most a caller-chosen number
//! of additional vertices and returns. Running many small batches settles the same vertices
//! with the same distances as one unbounded batch, which is what lets a background task
//! interleave progress reports and cancellation checks with the search itself.
//!
//! ### Invariants
//! - `settled[v]` implies `distance[v]` and `predecessor[v]` never change again.
//! - `v` is in the frontier iff `distance[v]` is known and `v` is not settled.
//! - The frontier holds at most one entry per vertex.
//! - After a failed batch the search is stuck until the next `set_start`: the failing vertex
//!   was settled without relaxing all of its edges, so resuming could miss vertices.

use tracing::{debug, trace, warn};

use super::{Distance, PathSnapshot};
use crate::collections::{BitSet, MinQueue};
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, VertexId, Weigher};

/// Shortest paths from a single start vertex, computed incrementally.
pub struct ShortestPaths<G: Graph, W> {
    graph: G,
    weigher: W,
    start: Option<VertexId>,
    distances: Vec<Option<Distance>>,
    predecessors: Vec<Option<VertexId>>,
    frontier: MinQueue<VertexId, Distance>,
    settled: BitSet,
    failure: Option<Error>,
}

impl<G, W> ShortestPaths<G, W>
where
    G: Graph,
    W: Weigher<G::Edge>,
{
    /// Creates a solver for `graph` with edge costs from `weigher`. No start is set.
    pub fn new(graph: G, weigher: W) -> Self {
        let n = graph.vertex_count();
        Self {
            graph,
            weigher,
            start: None,
            distances: vec![None; n],
            predecessors: vec![None; n],
            frontier: MinQueue::new(),
            settled: BitSet::with_capacity(n),
            failure: None,
        }
    }

    /// The graph being searched.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// The weight function in use.
    pub fn weigher(&self) -> &W {
        &self.weigher
    }

    /// Current start vertex, if one has been set.
    pub fn start_id(&self) -> Option<VertexId> {
        self.start
    }

    /// Number of vertices whose shortest path is final.
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// Number of vertices in the graph.
    pub fn vertex_count(&self) -> usize {
        self.distances.len()
    }

    /// Number of discovered, unsettled vertices.
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Fraction of all vertices settled so far, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        match self.vertex_count() {
            0 => 0.0,
            n => self.settled_count() as f64 / n as f64,
        }
    }

    /// Whether every vertex reachable from the start has been settled.
    /// `false` until a start is set, and after a failed batch.
    pub fn all_paths_found(&self) -> bool {
        self.start.is_some() && self.failure.is_none() && self.frontier.is_empty()
    }

    /// The error that stopped the current search, if any.
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    fn reset(&mut self) {
        self.distances.iter_mut().for_each(|d| *d = None);
        self.predecessors.iter_mut().for_each(|p| *p = None);
        self.frontier.clear();
        self.settled.clear();
        self.failure = None;
        self.start = None;
    }

    /// Discards all results and starts a new search from `start`.
    ///
    /// # Panics
    /// Panics if `start` is not a vertex of the graph.
    pub fn set_start(&mut self, start: VertexId) {
        let n = self.vertex_count();
        assert!(start < n, "start vertex {start} out of range for n={n}");
        self.reset();
        self.start = Some(start);
        self.distances[start] = Some(0);
        self.frontier.add_or_update(start, 0);
        debug!(start, vertex_count = n, "shortest-path search reset");
    }

    /// Snapshot of the current state without doing any work.
    ///
    /// # Panics
    /// Panics if no start has been set.
    pub fn snapshot(&self) -> PathSnapshot {
        let start = self.require_start();
        PathSnapshot::capture(start, &self.distances, &self.predecessors, &self.settled)
    }

    /// Settles up to `max_to_settle` more vertices, closest first, and returns a snapshot.
    ///
    /// Returns early once the frontier is empty. Among vertices tied for closest, which one
    /// is settled first is unspecified.
    ///
    /// # Panics
    /// Panics if no start has been set, or if relaxation fails (see
    /// [`try_extend_search`](Self::try_extend_search)).
    pub fn extend_search(&mut self, max_to_settle: usize) -> PathSnapshot {
        match self.try_extend_search(max_to_settle) {
            Ok(snapshot) => snapshot,
            Err(err) => panic!("shortest-path search failed: {err}"),
        }
    }

    /// Fallible form of [`extend_search`](Self::extend_search).
    ///
    /// Fails if an edge points outside the graph or a distance overflows. The state reached
    /// before the failure stays visible through [`snapshot`](Self::snapshot), but every
    /// further call returns the same error until [`set_start`](Self::set_start) is called.
    ///
    /// # Panics
    /// Panics if no start has been set.
    pub fn try_extend_search(&mut self, max_to_settle: usize) -> Result<PathSnapshot> {
        let start = self.require_start();
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Err(err) = self.settle(max_to_settle) {
            warn!(start, error = %err, "shortest-path search failed");
            self.failure = Some(err.clone());
            return Err(err);
        }
        Ok(PathSnapshot::capture(
            start,
            &self.distances,
            &self.predecessors,
            &self.settled,
        ))
    }

    fn settle(&mut self, max_to_settle: usize) -> Result<()> {
        let n = self.vertex_count();
        let mut newly_settled = 0usize;

        while newly_settled < max_to_settle {
            let Some((current, current_distance)) = self.frontier.pop() else {
                break;
            };
            if !self.settled.insert(current) {
                continue;
            }
            newly_settled += 1;
            debug_assert_eq!(self.distances[current], Some(current_distance));

            for edge in self.graph.outgoing_edges(current) {
                let neighbor = edge.end_id();
                if neighbor >= n {
                    return Err(Error::EdgeOutOfBounds {
                        start: current,
                        end: neighbor,
                        vertex_count: n,
                    });
                }
                if self.settled.contains(neighbor) {
                    continue;
                }
                let candidate = current_distance
                    .checked_add(Distance::from(self.weigher.weight(&edge)))
                    .ok_or(Error::DistanceOverflow { vertex: neighbor })?;
                if self.distances[neighbor].map_or(true, |known| candidate < known) {
                    self.distances[neighbor] = Some(candidate);
                    self.predecessors[neighbor] = Some(current);
                    self.frontier.add_or_update(neighbor, candidate);
                }
            }
        }

        trace!(
            newly_settled,
            settled = self.settled.len(),
            frontier = self.frontier.len(),
            "extended search"
        );
        Ok(())
    }

    /// Solves for every vertex reachable from `start` in one go.
    ///
    /// # Panics
    /// Panics if `start` is out of range or relaxation fails.
    pub fn find_all_paths(&mut self, start: VertexId) -> PathSnapshot {
        self.set_start(start);
        let snapshot = self.extend_search(usize::MAX);
        debug_assert!(self.all_paths_found());
        snapshot
    }

    fn require_start(&self) -> VertexId {
        match self.start {
            Some(start) => start,
            None => panic!("no start vertex set; call set_start first"),
        }
    }
}

impl<G: Graph, W> core::fmt::Debug for ShortestPaths<G, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShortestPaths")
            .field("start", &self.start)
            .field("vertex_count", &self.distances.len())
            .field("settled", &self.settled.len())
            .field("frontier", &self.frontier.len())
            .field("failure", &self.failure)
            .finish()
    }
}
