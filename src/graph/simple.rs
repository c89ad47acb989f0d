//! Labelled adjacency-list graph whose edges carry their own weight.
//!
//! Mostly used to describe small hand-written graphs:
//!
//! ```text
//! A -> B 9     directed edge, weight 9
//! A -- C       undirected edge (two directed edges), weight defaults to 1
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use super::{Edge, Graph, VertexId, Weigher, Weight};
use crate::error::{Error, Result};

/// An edge that stores its weight intrinsically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimpleEdge {
    /// Source vertex.
    pub start: VertexId,
    /// Target vertex.
    pub end: VertexId,
    /// Intrinsic cost, read by [`SimpleWeigher`].
    pub weight: Weight,
}

impl Edge for SimpleEdge {
    #[inline]
    fn start_id(&self) -> VertexId {
        self.start
    }

    #[inline]
    fn end_id(&self) -> VertexId {
        self.end
    }
}

/// A vertex with a label and its outgoing edges.
#[derive(Debug, Clone)]
pub struct SimpleVertex {
    id: VertexId,
    label: String,
    outgoing: Vec<SimpleEdge>,
}

impl SimpleVertex {
    /// Dense id of this vertex.
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Edges leaving this vertex.
    pub fn outgoing_edges(&self) -> &[SimpleEdge] {
        &self.outgoing
    }
}

/// Weigher that reads [`SimpleEdge::weight`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleWeigher;

impl Weigher<SimpleEdge> for SimpleWeigher {
    #[inline]
    fn weight(&self, edge: &SimpleEdge) -> Weight {
        edge.weight
    }
}

/// A directed graph of labelled vertices.
#[derive(Debug, Clone, Default)]
pub struct SimpleGraph {
    vertices: Vec<SimpleVertex>,
    labels: HashMap<String, VertexId>,
}

impl SimpleGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex and returns its id. Labels are expected to be unique; a repeated
    /// label is re-pointed at the newest vertex.
    pub fn add_vertex(&mut self, label: impl Into<String>) -> VertexId {
        let id = self.vertices.len();
        let label = label.into();
        self.labels.insert(label.clone(), id);
        self.vertices.push(SimpleVertex {
            id,
            label,
            outgoing: Vec::new(),
        });
        id
    }

    /// Adds the directed edge `start -> end`. An identical edge is stored once.
    ///
    /// # Panics
    /// Panics if either endpoint is not a vertex of this graph.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId, weight: Weight) {
        let n = self.vertices.len();
        assert!(start < n && end < n, "edge {start}->{end} is out of bounds for n={n}");
        let edge = SimpleEdge { start, end, weight };
        let outgoing = &mut self.vertices[start].outgoing;
        if !outgoing.contains(&edge) {
            outgoing.push(edge);
        }
    }

    /// Vertex with id `id`.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    pub fn vertex(&self, id: VertexId) -> &SimpleVertex {
        &self.vertices[id]
    }

    /// Id of the vertex labelled `label`.
    pub fn id_of(&self, label: &str) -> Option<VertexId> {
        self.labels.get(label).copied()
    }

    /// Vertex labelled `label`.
    pub fn vertex_by_label(&self, label: &str) -> Option<&SimpleVertex> {
        self.id_of(label).map(|id| &self.vertices[id])
    }

    /// Labels of `ids`, in order. Handy for checking reconstructed paths.
    pub fn labels_of<'a>(&'a self, ids: impl IntoIterator<Item = &'a VertexId>) -> Vec<&'a str> {
        ids.into_iter().map(|&id| self.vertices[id].label()).collect()
    }

    /// Parses the line-oriented text format described in the module docs.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut graph = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < 3 || tokens.len() > 4 {
                return Err(Error::ParseGraph {
                    line,
                    message: format!("expected `start kind end [weight]`, got `{}`", raw.trim()),
                });
            }
            let weight = match tokens.get(3) {
                Some(tok) => tok.parse::<Weight>().map_err(|e| Error::ParseGraph {
                    line,
                    message: format!("bad weight `{tok}`: {e}"),
                })?,
                None => 1,
            };

            let start = graph.id_or_insert(tokens[0]);
            let end = graph.id_or_insert(tokens[2]);
            match tokens[1] {
                "->" => graph.add_edge(start, end, weight),
                "--" => {
                    graph.add_edge(start, end, weight);
                    graph.add_edge(end, start, weight);
                }
                other => {
                    return Err(Error::ParseGraph {
                        line,
                        message: format!("unexpected edge type `{other}`"),
                    })
                }
            }
        }
        Ok(graph)
    }

    fn id_or_insert(&mut self, label: &str) -> VertexId {
        match self.id_of(label) {
            Some(id) => id,
            None => self.add_vertex(label),
        }
    }
}

impl FromStr for SimpleGraph {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl Graph for SimpleGraph {
    type Edge = SimpleEdge;

    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = SimpleEdge> + '_ {
        self.vertices[id].outgoing.iter().copied()
    }
}
