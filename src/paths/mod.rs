//! Single-source shortest paths over non-negative edge weights.
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `set_start` | O(V) |
//! | `extend_search(k)` | O(k · d · log V) + O(V) snapshot copy |
//! | `PathSnapshot::distance_to` | O(1) |
//! | `PathSnapshot::path_to` | O(path length) |
//!
//! `d` is the maximum out-degree.

mod snapshot;
mod solver;

pub use snapshot::{Path, PathSnapshot};
pub use solver::ShortestPaths;

/// Accumulated path cost. Wider than [`Weight`](crate::graph::Weight) so long paths do not
/// overflow.
pub type Distance = u64;
