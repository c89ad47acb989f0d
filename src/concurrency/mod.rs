//! Running searches off the caller's thread.
//!
//! - [`task`]: one worker thread per search, batch-wise progress, cooperative cancellation
//! - [`controller`]: generation-tracked owner of a solver with commit/rollback of results
//! - [`cancel`]: the cache-padded cancellation flag
//!
//! Workers report over a [`std::sync::mpsc`] channel and share nothing mutable with their
//! owner: the solver is moved into the worker, results come back as immutable
//! [`PathSnapshot`](crate::paths::PathSnapshot)s.

pub mod cancel;
pub mod controller;
pub mod task;

pub use cancel::CancelFlag;
pub use controller::{ControllerEvent, SearchController};
pub use task::{SearchTask, TaskEvent, TaskHandle, TaskOutcome, TaskState, DEFAULT_BATCH_SIZE};
