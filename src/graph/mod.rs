//! Read-only graph model searched by the solver.
//!
//! Vertices are addressed by dense integer ids in `[0, vertex_count)`; there is no pointer
//! graph. Edge costs are not part of the model: a [`Weigher`] turns an edge into a cost,
//! so one graph can be searched under several cost functions.
//!
//! - `simple`: labelled adjacency-list graph with a small text format
//! - `image`: pixel grid with 8-neighbour edges and named weight functions

pub mod image;
pub mod simple;

use std::sync::Arc;

pub use image::{
    make_weigher, Direction, GrayImage, ImageEdge, ImageGraph, ImageWeigher, Point, PolyLine,
    WeigherKind,
};
pub use simple::{SimpleEdge, SimpleGraph, SimpleVertex, SimpleWeigher};

/// Dense vertex identifier.
pub type VertexId = usize;

/// Non-negative edge cost produced by a [`Weigher`].
pub type Weight = u32;

/// A directed edge between two vertex ids.
pub trait Edge {
    /// Id of the vertex this edge leaves.
    fn start_id(&self) -> VertexId;
    /// Id of the vertex this edge enters.
    fn end_id(&self) -> VertexId;
}

/// A graph whose vertices are numbered `0..vertex_count()`.
pub trait Graph {
    /// Edge type yielded by [`Graph::outgoing_edges`].
    type Edge: Edge;

    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Edges leaving vertex `id`.
    ///
    /// Implementations may panic if `id >= vertex_count()`.
    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = Self::Edge> + '_;
}

/// Computes the cost of traversing an edge.
///
/// A weigher must be deterministic and free of side effects for the lifetime of a search.
pub trait Weigher<E> {
    /// Cost of `edge`.
    fn weight(&self, edge: &E) -> Weight;
}

impl<E, F> Weigher<E> for F
where
    F: Fn(&E) -> Weight,
{
    #[inline]
    fn weight(&self, edge: &E) -> Weight {
        self(edge)
    }
}

impl<G: Graph + ?Sized> Graph for &G {
    type Edge = G::Edge;

    #[inline]
    fn vertex_count(&self) -> usize {
        (**self).vertex_count()
    }

    #[inline]
    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = Self::Edge> + '_ {
        (**self).outgoing_edges(id)
    }
}

impl<G: Graph + ?Sized> Graph for Arc<G> {
    type Edge = G::Edge;

    #[inline]
    fn vertex_count(&self) -> usize {
        (**self).vertex_count()
    }

    #[inline]
    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = Self::Edge> + '_ {
        (**self).outgoing_edges(id)
    }
}
