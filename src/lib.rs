//! # `scissors` - Incremental Shortest Paths for Interactive Tracing
//!
//! Dijkstra's algorithm split into resumable batches, plus the machinery to run it on a
//! background thread while a user interface stays responsive. The motivating use is
//! "intelligent scissors": each pixel of an image is a vertex, edges to the eight
//! neighbours are cheap along strong image edges, and the shortest path between two
//! clicked points hugs the outline the user wants to select.
//!
//! ## Architecture
//!
//! 1. **Collections** ([`collections`]): a decrease-key binary heap ([`MinQueue`]) and a
//!    dense [`BitSet`].
//! 2. **Graphs** ([`graph`]): the read-only [`Graph`]/[`Edge`]/[`Weigher`] model with two
//!    implementations, labelled adjacency lists ([`SimpleGraph`]) and pixel grids
//!    ([`ImageGraph`]).
//! 3. **Paths** ([`paths`]): the incremental solver ([`ShortestPaths`]) and immutable,
//!    cheaply cloned results ([`PathSnapshot`]).
//! 4. **Concurrency** ([`concurrency`]): one worker thread per search, progress over a
//!    channel, cooperative cancellation, and a generation-tracked [`SearchController`].
//!
//! ### Guarantees
//!
//! - Running a search in many small batches settles the same vertices with the same
//!   distances as one unbounded run.
//! - A snapshot never changes after it is handed out.
//! - The solver belongs to exactly one thread at a time; it is moved into a worker and
//!   handed back on join.
//! - Events from a superseded search never reach the controller's results.
//!
//! ## Example
//!
//! ```rust
//! use scissors::{ShortestPaths, SimpleGraph, SimpleWeigher};
//!
//! let graph: SimpleGraph = "A -> B 2\nB -> C 2\nA -> C 5".parse().unwrap();
//! let a = graph.id_of("A").unwrap();
//! let c = graph.id_of("C").unwrap();
//!
//! let mut solver = ShortestPaths::new(&graph, SimpleWeigher);
//! solver.set_start(a);
//! let partial = solver.extend_search(1);
//! assert!(partial.settled(a) && !partial.settled(c));
//!
//! let done = solver.extend_search(usize::MAX);
//! assert_eq!(done.distance_to(c), Some(4));
//! assert_eq!(graph.labels_of(done.path_to(c).vertices()), ["A", "B", "C"]);
//! // The earlier snapshot is unaffected.
//! assert_eq!(partial.settled_count(), 1);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod paths;

pub use collections::{BitSet, MinQueue};
pub use concurrency::{
    CancelFlag, ControllerEvent, SearchController, SearchTask, TaskEvent, TaskHandle,
    TaskOutcome, TaskState,
};
pub use config::SearchConfig;
pub use error::{Error, Result};
pub use graph::{
    Edge, GrayImage, Graph, ImageGraph, ImageWeigher, Point, PolyLine, SimpleGraph,
    SimpleWeigher, VertexId, WeigherKind, Weigher, Weight,
};
pub use paths::{Distance, Path, PathSnapshot, ShortestPaths};
