//! Background shortest-path search.
//!
//! [`SearchTask::spawn`] moves a [`ShortestPaths`] solver onto its own thread and runs it
//! in bounded batches. Between batches the worker publishes a [`TaskEvent::Progress`] and
//! checks its [`CancelFlag`]; when it stops it sends exactly one [`TaskEvent::Finished`].
//! Every event carries the task's generation so a consumer juggling restarts can tell
//! current events from stale ones.
//!
//! The solver travels with the task: [`TaskHandle::join`] hands it back so the next search
//! can reuse its allocations. While the task runs nobody else can touch the solver.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context};
use tracing::{debug, trace, warn};

use super::cancel::CancelFlag;
use crate::graph::{Graph, VertexId, Weigher};
use crate::paths::{PathSnapshot, ShortestPaths};

/// Number of vertices settled between progress reports unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Lifecycle of a background search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskState {
    /// No search has been started.
    #[default]
    Idle,
    /// A worker is settling vertices.
    Running,
    /// Every reachable vertex was settled.
    Completed,
    /// The search stopped at a batch boundary because it was asked to.
    Cancelled,
    /// The search hit an error or panicked.
    Failed,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Cancelled` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Cancelled | TaskState::Failed
        )
    }
}

/// How a search ended.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Final paths to every reachable vertex.
    Completed(PathSnapshot),
    /// Cancellation was observed before the search finished.
    Cancelled,
    /// Relaxation failed or the search panicked.
    Failed(anyhow::Error),
}

impl TaskOutcome {
    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed(_) => TaskState::Completed,
            TaskOutcome::Cancelled => TaskState::Cancelled,
            TaskOutcome::Failed(_) => TaskState::Failed,
        }
    }
}

/// Message from a worker to whoever started it.
#[derive(Debug)]
pub enum TaskEvent {
    /// Sent after every batch, in increasing `settled` order.
    Progress {
        /// Generation of the task that sent this.
        generation: u64,
        /// State after the batch.
        snapshot: PathSnapshot,
        /// Vertices settled so far.
        settled: usize,
        /// Vertices in the graph.
        vertex_count: usize,
    },
    /// Sent once, after all progress events.
    Finished {
        /// Generation of the task that sent this.
        generation: u64,
        /// How the search ended.
        outcome: TaskOutcome,
    },
}

impl TaskEvent {
    /// Generation of the task that sent this event.
    pub fn generation(&self) -> u64 {
        match self {
            TaskEvent::Progress { generation, .. } | TaskEvent::Finished { generation, .. } => {
                *generation
            }
        }
    }
}

/// Fraction `settled / vertex_count`, `0.0` for an empty graph.
#[allow(clippy::cast_precision_loss)]
pub fn progress_fraction(settled: usize, vertex_count: usize) -> f64 {
    if vertex_count == 0 {
        0.0
    } else {
        settled as f64 / vertex_count as f64
    }
}

/// A search waiting to be spawned.
pub struct SearchTask<G: Graph, W> {
    solver: ShortestPaths<G, W>,
    start: VertexId,
    batch_size: usize,
    generation: u64,
}

impl<G, W> SearchTask<G, W>
where
    G: Graph + Send + 'static,
    W: Weigher<G::Edge> + Send + 'static,
{
    /// Prepares a search from `start` with the default batch size and generation 0.
    ///
    /// # Panics
    /// Panics if `start` is not a vertex of the solver's graph.
    pub fn new(solver: ShortestPaths<G, W>, start: VertexId) -> Self {
        let n = solver.vertex_count();
        assert!(start < n, "start vertex {start} out of range for n={n}");
        Self {
            solver,
            start,
            batch_size: DEFAULT_BATCH_SIZE,
            generation: 0,
        }
    }

    /// Sets how many vertices to settle between progress reports.
    ///
    /// # Panics
    /// Panics if `batch_size` is zero.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be at least 1");
        self.batch_size = batch_size;
        self
    }

    /// Tags every event of this task with `generation`.
    #[must_use]
    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Starts the worker thread. Events go to `events`.
    pub fn spawn(self, events: Sender<TaskEvent>) -> TaskHandle<G, W> {
        let cancel = CancelFlag::new();
        let worker_cancel = cancel.clone();
        let generation = self.generation;
        let thread = thread::spawn(move || self.run(&worker_cancel, &events));
        TaskHandle {
            generation,
            cancel,
            thread: Some(thread),
        }
    }

    fn run(self, cancel: &CancelFlag, events: &Sender<TaskEvent>) -> ShortestPaths<G, W> {
        let SearchTask {
            mut solver,
            start,
            batch_size,
            generation,
        } = self;
        debug!(generation, start, batch_size, "search task started");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            search(&mut solver, start, batch_size, generation, cancel, events)
        }));
        let outcome = match result {
            Ok(Ok(Some(snapshot))) => TaskOutcome::Completed(snapshot),
            Ok(Ok(None)) => TaskOutcome::Cancelled,
            Ok(Err(err)) => TaskOutcome::Failed(err),
            Err(payload) => TaskOutcome::Failed(anyhow!(
                "search from vertex {start} panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        match &outcome {
            TaskOutcome::Failed(err) => warn!(generation, error = %err, "search task failed"),
            _ => debug!(
                generation,
                state = ?outcome.state(),
                settled = solver.settled_count(),
                "search task finished"
            ),
        }
        if events.send(TaskEvent::Finished { generation, outcome }).is_err() {
            trace!(generation, "no receiver for search outcome");
        }
        solver
    }
}

/// Runs batches until every reachable vertex is settled (`Some`) or the search is
/// cancelled (`None`).
fn search<G, W>(
    solver: &mut ShortestPaths<G, W>,
    start: VertexId,
    batch_size: usize,
    generation: u64,
    cancel: &CancelFlag,
    events: &Sender<TaskEvent>,
) -> anyhow::Result<Option<PathSnapshot>>
where
    G: Graph,
    W: Weigher<G::Edge>,
{
    solver.set_start(start);
    let mut snapshot = solver.snapshot();
    while !solver.all_paths_found() {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        snapshot = solver
            .try_extend_search(batch_size)
            .with_context(|| format!("search from vertex {start} failed"))?;
        let progress = TaskEvent::Progress {
            generation,
            snapshot: snapshot.clone(),
            settled: snapshot.settled_count(),
            vertex_count: snapshot.vertex_count(),
        };
        if events.send(progress).is_err() {
            debug!(generation, "event receiver dropped; abandoning search");
            return Ok(None);
        }
    }
    Ok(Some(snapshot))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Owner's side of a running search.
///
/// Dropping the handle raises the cancel flag and detaches the worker.
pub struct TaskHandle<G: Graph, W> {
    generation: u64,
    cancel: CancelFlag,
    thread: Option<JoinHandle<ShortestPaths<G, W>>>,
}

impl<G: Graph, W> TaskHandle<G, W> {
    /// Generation this task was spawned with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Asks the worker to stop at the next batch boundary. Does not wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the worker to exit and takes the solver back.
    pub fn join(mut self) -> ShortestPaths<G, W> {
        let thread = self
            .thread
            .take()
            .unwrap_or_else(|| unreachable!("task joined twice"));
        match thread.join() {
            Ok(solver) => solver,
            // The search itself runs under catch_unwind; only event plumbing can land here.
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<G: Graph, W> Drop for TaskHandle<G, W> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel.cancel();
        }
    }
}

impl<G: Graph, W> core::fmt::Debug for TaskHandle<G, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("generation", &self.generation)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver};

    use crate::graph::{SimpleGraph, SimpleWeigher};

    fn chain(n: usize) -> SimpleGraph {
        let mut g = SimpleGraph::new();
        for i in 0..n {
            g.add_vertex(format!("v{i}"));
        }
        for i in 1..n {
            g.add_edge(i - 1, i, 1);
        }
        g
    }

    fn drain(rx: &Receiver<TaskEvent>) -> (Vec<usize>, TaskOutcome) {
        let mut settled = Vec::new();
        loop {
            match rx.recv().unwrap() {
                TaskEvent::Progress { settled: s, .. } => settled.push(s),
                TaskEvent::Finished { outcome, .. } => return (settled, outcome),
            }
        }
    }

    #[test]
    fn test_completes_with_monotonic_progress() {
        let (tx, rx) = channel();
        let solver = ShortestPaths::new(chain(10), SimpleWeigher);
        let handle = SearchTask::new(solver, 0)
            .batch_size(3)
            .generation(7)
            .spawn(tx);
        let (settled, outcome) = drain(&rx);
        assert_eq!(settled, vec![3, 6, 9, 10]);
        match outcome {
            TaskOutcome::Completed(snap) => assert_eq!(snap.distance_to(9), Some(9)),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(handle.generation(), 7);
        let solver = handle.join();
        assert!(solver.all_paths_found());
    }

    #[test]
    fn test_panicking_weigher_fails_the_task() {
        let (tx, rx) = channel();
        let weigher = |e: &crate::graph::SimpleEdge| -> u32 {
            assert!(e.end != 3, "weigher refused edge into 3");
            1
        };
        let solver = ShortestPaths::new(chain(5), weigher);
        let handle = SearchTask::new(solver, 0).batch_size(1).spawn(tx);
        let (_, outcome) = drain(&rx);
        match outcome {
            TaskOutcome::Failed(err) => {
                assert!(err.to_string().contains("weigher refused edge into 3"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        // The solver survives and can search again.
        let mut solver = handle.join();
        let snap = solver.find_all_paths(4);
        assert_eq!(snap.settled_count(), 1);
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(0, 0), 0.0);
        assert_eq!(progress_fraction(5, 10), 0.5);
    }

    #[test]
    #[should_panic(expected = "batch size must be at least 1")]
    fn test_zero_batch_rejected() {
        let solver = ShortestPaths::new(chain(2), SimpleWeigher);
        let _ = SearchTask::new(solver, 0).batch_size(0);
    }
}
