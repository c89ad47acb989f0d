//! Immutable captures of solver state.
//!
//! A [`PathSnapshot`] owns copies of the distance, predecessor and settled arrays taken at
//! one instant. The solver keeps mutating its own arrays afterwards; snapshots already
//! handed out never observe that. Clones share one allocation, so a snapshot can be
//! published to another thread and kept around for display at no extra cost.

use std::sync::Arc;

use super::Distance;
use crate::collections::BitSet;
use crate::graph::VertexId;

/// A sequence of vertex ids forming a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    vertices: Vec<VertexId>,
}

impl Path {
    /// Wraps `vertices` in traversal order.
    pub fn new(vertices: Vec<VertexId>) -> Self {
        Self { vertices }
    }

    /// The vertex ids in order.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Number of vertices on the path.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` for the empty path.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// First vertex.
    pub fn first(&self) -> Option<VertexId> {
        self.vertices.first().copied()
    }

    /// Last vertex.
    pub fn last(&self) -> Option<VertexId> {
        self.vertices.last().copied()
    }

    /// The same path traversed back to front.
    #[must_use]
    pub fn reversed(&self) -> Path {
        Path {
            vertices: self.vertices.iter().rev().copied().collect(),
        }
    }

    /// Iterates over the vertex ids in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }
}

impl IntoIterator for Path {
    type Item = VertexId;
    type IntoIter = std::vec::IntoIter<VertexId>;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices.into_iter()
    }
}

struct SnapshotData {
    start: VertexId,
    distances: Box<[Option<Distance>]>,
    predecessors: Box<[Option<VertexId>]>,
    settled: BitSet,
}

/// Point-in-time shortest-path results from one start vertex.
#[derive(Clone)]
pub struct PathSnapshot {
    data: Arc<SnapshotData>,
}

impl PathSnapshot {
    /// Copies the given state. The arrays must all have one slot per vertex.
    ///
    /// # Panics
    /// Panics if the array lengths disagree or `start` is out of range.
    pub fn capture(
        start: VertexId,
        distances: &[Option<Distance>],
        predecessors: &[Option<VertexId>],
        settled: &BitSet,
    ) -> Self {
        let n = distances.len();
        assert!(
            predecessors.len() == n && settled.capacity() == n,
            "snapshot arrays disagree on vertex count"
        );
        assert!(start < n, "start {start} out of range for n={n}");
        Self {
            data: Arc::new(SnapshotData {
                start,
                distances: distances.into(),
                predecessors: predecessors.into(),
                settled: settled.clone(),
            }),
        }
    }

    /// The start vertex every path begins at.
    pub fn start_id(&self) -> VertexId {
        self.data.start
    }

    /// Number of vertices in the searched graph.
    pub fn vertex_count(&self) -> usize {
        self.data.distances.len()
    }

    /// Number of vertices whose shortest path was final when this snapshot was taken.
    pub fn settled_count(&self) -> usize {
        self.data.settled.len()
    }

    /// Best known distance to `id`, or `None` if `id` has not been discovered.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    pub fn distance_to(&self, id: VertexId) -> Option<Distance> {
        self.data.distances[id]
    }

    /// Whether some path to `id` is known.
    pub fn discovered(&self, id: VertexId) -> bool {
        self.distance_to(id).is_some()
    }

    /// Whether the shortest path to `id` is final.
    pub fn settled(&self, id: VertexId) -> bool {
        self.data.settled.contains(id)
    }

    /// Best known path from the start to `id`, reading start → … → `id`.
    ///
    /// The start's own path is `[start]`.
    ///
    /// # Panics
    /// Panics if `id` has not been discovered.
    pub fn path_to(&self, id: VertexId) -> Path {
        self.reversed_path_to(id).reversed()
    }

    /// Like [`path_to`](Self::path_to), but `None` for an undiscovered vertex.
    pub fn try_path_to(&self, id: VertexId) -> Option<Path> {
        self.discovered(id).then(|| self.path_to(id))
    }

    /// The path to `id` read backwards, `id` → … → start, straight off the predecessor
    /// chain. Used to splice a segment that must run toward the start vertex.
    ///
    /// # Panics
    /// Panics if `id` has not been discovered.
    pub fn reversed_path_to(&self, id: VertexId) -> Path {
        assert!(
            self.discovered(id),
            "no path to undiscovered vertex {id} from {}",
            self.data.start
        );
        let mut vertices = vec![id];
        let mut current = id;
        while let Some(prev) = self.data.predecessors[current] {
            vertices.push(prev);
            current = prev;
        }
        debug_assert_eq!(current, self.data.start);
        Path::new(vertices)
    }

    /// Vertices discovered but not yet settled when the snapshot was taken.
    pub fn frontier(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.data
            .distances
            .iter()
            .enumerate()
            .filter(|&(id, d)| d.is_some() && !self.data.settled.contains(id))
            .map(|(id, _)| id)
    }

    /// Settled vertices in increasing id order.
    pub fn settled_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.data.settled.iter()
    }

    /// Returns `true` if both handles share the same captured state.
    pub fn ptr_eq(&self, other: &PathSnapshot) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl core::fmt::Debug for PathSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PathSnapshot")
            .field("start", &self.data.start)
            .field("vertex_count", &self.vertex_count())
            .field("settled", &self.settled_count())
            .finish()
    }
}
