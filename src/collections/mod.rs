//! Collections backing the shortest-path solver.
//!
//! - `min_queue`: decrease-key binary heap used as the Dijkstra frontier
//! - `bit_set`: dense settled-vertex flags with an O(1) population count

pub mod bit_set;
pub mod min_queue;

pub use bit_set::BitSet;
pub use min_queue::MinQueue;
