//! Owner of one solver and at most one background search.
//!
//! The controller is driven from a single thread (typically a UI loop). It starts and
//! cancels searches, and turns worker events into [`ControllerEvent`]s when the owner calls
//! [`poll`](SearchController::poll) or [`wait`](SearchController::wait).
//!
//! Each search gets a fresh generation number. Events from any other generation are
//! dropped, so a worker that was superseded by a restart or a reset can never overwrite
//! newer results.
//!
//! Results follow a commit/rollback discipline: a completed search becomes the
//! [`committed`](SearchController::committed) snapshot; a cancelled or failed one leaves
//! the previous commit in place and rolls [`pending`](SearchController::pending) back to it.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::task::{
    progress_fraction, SearchTask, TaskEvent, TaskHandle, TaskOutcome, TaskState,
    DEFAULT_BATCH_SIZE,
};
use crate::config::SearchConfig;
use crate::graph::{Graph, VertexId, Weigher};
use crate::paths::{PathSnapshot, ShortestPaths};

/// Notification produced by [`SearchController::poll`] and friends.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Fraction of vertices settled by the active search.
    ProgressChanged(f64),
    /// The pending snapshot changed: new progress, a commit, or a rollback.
    PendingPathsChanged(PathSnapshot),
    /// The controller moved between states.
    StateChanged {
        /// Previous state.
        old: TaskState,
        /// Current state.
        new: TaskState,
    },
    /// The active search failed.
    Failed(anyhow::Error),
}

/// Runs searches on a background thread and tracks their results.
pub struct SearchController<G: Graph, W> {
    /// `None` while a worker owns it.
    solver: Option<ShortestPaths<G, W>>,
    active: Option<TaskHandle<G, W>>,
    events_tx: Sender<TaskEvent>,
    events_rx: Receiver<TaskEvent>,
    generation: u64,
    batch_size: usize,
    state: TaskState,
    committed: Option<PathSnapshot>,
    pending: Option<PathSnapshot>,
    progress: f64,
    outbox: VecDeque<ControllerEvent>,
}

impl<G, W> SearchController<G, W>
where
    G: Graph + Send + 'static,
    W: Weigher<G::Edge> + Send + 'static,
{
    /// Wraps `solver` with the default batch size.
    pub fn new(solver: ShortestPaths<G, W>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            solver: Some(solver),
            active: None,
            events_tx,
            events_rx,
            generation: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            state: TaskState::Idle,
            committed: None,
            pending: None,
            progress: 0.0,
            outbox: VecDeque::new(),
        }
    }

    /// Wraps `solver` using the batch size from `config`.
    pub fn with_config(solver: ShortestPaths<G, W>, config: &SearchConfig) -> Self {
        Self::new(solver).with_batch_size(config.batch_size)
    }

    /// Sets the number of vertices settled between progress reports.
    ///
    /// # Panics
    /// Panics if `batch_size` is zero.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be at least 1");
        self.batch_size = batch_size;
        self
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Generation of the most recently started search.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a worker is currently attached.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Snapshot of the last search that completed.
    pub fn committed(&self) -> Option<&PathSnapshot> {
        self.committed.as_ref()
    }

    /// Latest snapshot of the active search, or the committed one when idle.
    pub fn pending(&self) -> Option<&PathSnapshot> {
        self.pending.as_ref()
    }

    /// Progress of the active search in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The solver, unless a worker currently owns it.
    pub fn solver(&self) -> Option<&ShortestPaths<G, W>> {
        self.solver.as_ref()
    }

    /// Starts searching from `start` in the background.
    ///
    /// A search already in progress is cancelled and joined first; its remaining events
    /// become stale.
    ///
    /// # Panics
    /// Panics if `start` is not a vertex of the graph. The controller is left as it was.
    pub fn start(&mut self, start: VertexId) {
        self.retire_active();
        let n = self.solver.as_ref().map_or(0, |solver| solver.vertex_count());
        assert!(start < n, "start vertex {start} out of range for n={n}");
        let Some(solver) = self.solver.take() else {
            unreachable!("solver missing with no active task");
        };

        self.generation += 1;
        self.pending = None;
        self.set_progress(0.0);
        let handle = SearchTask::new(solver, start)
            .batch_size(self.batch_size)
            .generation(self.generation)
            .spawn(self.events_tx.clone());
        debug!(generation = self.generation, start, "started background search");
        self.active = Some(handle);
        self.set_state(TaskState::Running);
    }

    /// Asks the active search to stop. The controller reaches `Cancelled` once the worker
    /// acknowledges, observed through [`poll`](Self::poll) or [`wait`](Self::wait).
    pub fn cancel(&mut self) {
        if let Some(handle) = &self.active {
            debug!(generation = handle.generation(), "cancelling background search");
            handle.cancel();
        }
    }

    /// Abandons any active search and forgets all results.
    ///
    /// Blocks for at most one batch while the cancelled worker returns the solver.
    pub fn reset(&mut self) {
        self.retire_active();
        // Anything the retired worker queued is now stale.
        self.generation += 1;
        self.committed = None;
        self.pending = None;
        self.set_progress(0.0);
        self.set_state(TaskState::Idle);
    }

    /// Processes whatever the worker has sent so far without blocking.
    pub fn poll(&mut self) -> Vec<ControllerEvent> {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
        }
        self.outbox.drain(..).collect()
    }

    /// Blocks until the active search, if any, has finished.
    pub fn wait(&mut self) -> Vec<ControllerEvent> {
        while self.active.is_some() {
            match self.events_rx.recv() {
                Ok(event) => self.handle(event),
                Err(_) => break,
            }
        }
        self.poll()
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`. Check
    /// [`is_running`](Self::is_running) to see whether the search finished.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Vec<ControllerEvent> {
        let deadline = Instant::now() + timeout;
        while self.active.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        self.poll()
    }

    fn handle(&mut self, event: TaskEvent) {
        let current = self
            .active
            .as_ref()
            .is_some_and(|handle| handle.generation() == event.generation());
        if !current {
            trace!(
                generation = event.generation(),
                active = self.generation,
                "dropping stale search event"
            );
            return;
        }

        match event {
            TaskEvent::Progress {
                snapshot,
                settled,
                vertex_count,
                ..
            } => {
                self.set_progress(progress_fraction(settled, vertex_count));
                self.set_pending(Some(snapshot));
            }
            TaskEvent::Finished { outcome, .. } => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: TaskOutcome) {
        let Some(handle) = self.active.take() else {
            return;
        };
        // A cancel request wins even if the worker got to the end first.
        let cancelled = handle.is_cancelled();
        self.solver = Some(handle.join());

        match outcome {
            TaskOutcome::Completed(snapshot) if !cancelled => {
                debug!(
                    generation = self.generation,
                    settled = snapshot.settled_count(),
                    "committing search results"
                );
                self.set_progress(progress_fraction(
                    snapshot.settled_count(),
                    snapshot.vertex_count(),
                ));
                self.committed = Some(snapshot.clone());
                self.set_pending(Some(snapshot));
                self.set_state(TaskState::Completed);
            }
            TaskOutcome::Completed(_) | TaskOutcome::Cancelled => {
                debug!(generation = self.generation, "search cancelled; rolling back");
                self.rollback();
                self.set_state(TaskState::Cancelled);
            }
            TaskOutcome::Failed(err) => {
                warn!(generation = self.generation, error = %err, "search failed; rolling back");
                self.rollback();
                self.set_state(TaskState::Failed);
                self.outbox.push_back(ControllerEvent::Failed(err));
            }
        }
    }

    fn rollback(&mut self) {
        self.set_pending(self.committed.clone());
    }

    /// Cancels and joins the active worker, if any, reclaiming the solver.
    fn retire_active(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
            debug!(generation = handle.generation(), "retiring background search");
            self.solver = Some(handle.join());
        }
    }

    fn set_state(&mut self, new: TaskState) {
        let old = self.state;
        if old != new {
            self.state = new;
            self.outbox
                .push_back(ControllerEvent::StateChanged { old, new });
        }
    }

    fn set_progress(&mut self, progress: f64) {
        if progress != self.progress {
            self.progress = progress;
            self.outbox
                .push_back(ControllerEvent::ProgressChanged(progress));
        }
    }

    fn set_pending(&mut self, pending: Option<PathSnapshot>) {
        let unchanged = match (&self.pending, &pending) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        self.pending = pending;
        if !unchanged {
            if let Some(snapshot) = &self.pending {
                self.outbox
                    .push_back(ControllerEvent::PendingPathsChanged(snapshot.clone()));
            }
        }
    }
}

impl<G: Graph, W> core::fmt::Debug for SearchController<G, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SearchController")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("progress", &self.progress)
            .field("running", &self.active.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{SimpleGraph, SimpleWeigher};

    fn controller() -> (SimpleGraph, SearchController<SimpleGraph, SimpleWeigher>) {
        let g = SimpleGraph::from_text("a -> b 2\nb -> c 2\na -> c 5\nd -> a 1").unwrap();
        let solver = ShortestPaths::new(g.clone(), SimpleWeigher);
        (g, SearchController::new(solver).with_batch_size(1))
    }

    #[test]
    fn test_completed_search_is_committed() {
        let (g, mut ctl) = controller();
        assert_eq!(ctl.state(), TaskState::Idle);
        ctl.start(g.id_of("a").unwrap());
        assert_eq!(ctl.state(), TaskState::Running);
        let events = ctl.wait();
        assert_eq!(ctl.state(), TaskState::Completed);
        assert!(!ctl.is_running());
        assert!(ctl.solver().is_some());

        let committed = ctl.committed().unwrap();
        assert_eq!(committed.distance_to(g.id_of("c").unwrap()), Some(4));
        assert!(!committed.discovered(g.id_of("d").unwrap()));
        assert!(ctl.pending().unwrap().ptr_eq(committed));
        assert_eq!(ctl.progress(), 0.75);

        assert!(matches!(
            events.last(),
            Some(ControllerEvent::StateChanged {
                old: TaskState::Running,
                new: TaskState::Completed
            })
        ));
        let progress: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::ProgressChanged(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_reset_forgets_results() {
        let (g, mut ctl) = controller();
        ctl.start(g.id_of("a").unwrap());
        ctl.wait();
        ctl.reset();
        assert_eq!(ctl.state(), TaskState::Idle);
        assert!(ctl.committed().is_none());
        assert!(ctl.pending().is_none());
        assert_eq!(ctl.progress(), 0.0);
        let events = ctl.poll();
        assert!(events.iter().any(|e| matches!(
            e,
            ControllerEvent::StateChanged {
                old: TaskState::Completed,
                new: TaskState::Idle
            }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ControllerEvent::ProgressChanged(p) if *p == 0.0)));
        // Reset twice is the same as once.
        ctl.reset();
        assert_eq!(ctl.state(), TaskState::Idle);
        assert!(ctl.poll().is_empty());
    }

    #[test]
    fn test_bad_start_keeps_controller_usable() {
        let (g, mut ctl) = controller();
        let generation = ctl.generation();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ctl.start(99)));
        let message = *result.unwrap_err().downcast::<String>().unwrap();
        assert!(message.contains("out of range"), "{message}");
        assert_eq!(ctl.generation(), generation);
        assert_eq!(ctl.state(), TaskState::Idle);
        assert!(ctl.solver().is_some());

        ctl.start(g.id_of("a").unwrap());
        ctl.wait();
        assert_eq!(ctl.state(), TaskState::Completed);
    }

    #[test]
    fn test_restart_discards_previous_search() {
        let (g, mut ctl) = controller();
        ctl.start(g.id_of("a").unwrap());
        let first = ctl.generation();
        ctl.start(g.id_of("d").unwrap());
        assert_eq!(ctl.generation(), first + 1);
        ctl.wait();
        assert_eq!(ctl.state(), TaskState::Completed);
        assert_eq!(ctl.committed().unwrap().start_id(), g.id_of("d").unwrap());
    }
}
