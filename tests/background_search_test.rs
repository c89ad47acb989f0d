use std::sync::mpsc::channel;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use scissors::graph::SimpleEdge;
use scissors::{
    ControllerEvent, Graph, PathSnapshot, SearchController, SearchTask, ShortestPaths,
    SimpleGraph, SimpleWeigher, TaskEvent, TaskOutcome, TaskState, VertexId, Weight,
};

/// Blocks weigher calls while closed.
#[derive(Clone, Default)]
struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    fn closed() -> Self {
        Self::default()
    }

    fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn close(&self) {
        *self.0 .0.lock().unwrap() = false;
    }

    fn pass(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }

    fn open_after(&self, delay: Duration) -> thread::JoinHandle<()> {
        let gate = self.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            gate.open();
        })
    }
}

fn gated_weigher(gate: &Gate) -> impl Fn(&SimpleEdge) -> Weight + Send + 'static {
    let gate = gate.clone();
    move |edge: &SimpleEdge| {
        gate.pass();
        edge.weight
    }
}

fn chain(n: usize) -> Arc<SimpleGraph> {
    let mut g = SimpleGraph::new();
    for i in 0..n {
        g.add_vertex(format!("v{i}"));
    }
    for i in 1..n {
        g.add_edge(i - 1, i, 1);
        g.add_edge(i, i - 1, 1);
    }
    Arc::new(g)
}

fn snapshots(events: &[ControllerEvent]) -> Vec<PathSnapshot> {
    events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::PendingPathsChanged(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn states(events: &[ControllerEvent]) -> Vec<(TaskState, TaskState)> {
    events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::StateChanged { old, new } => Some((*old, *new)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_background_search_completes() {
    let g = chain(200);
    let solver = ShortestPaths::new(Arc::clone(&g), SimpleWeigher);
    let mut ctl = SearchController::new(solver).with_batch_size(16);
    ctl.start(0);
    let events = ctl.wait();

    assert_eq!(ctl.state(), TaskState::Completed);
    assert_eq!(ctl.progress(), 1.0);
    let committed = ctl.committed().unwrap();
    assert_eq!(committed.distance_to(199), Some(199));
    assert_eq!(committed.path_to(199).len(), 200);

    let published = snapshots(&events);
    assert!(!published.is_empty());
    assert!(published
        .windows(2)
        .all(|w| w[0].settled_count() <= w[1].settled_count()));
    assert_eq!(
        states(&events),
        [
            (TaskState::Idle, TaskState::Running),
            (TaskState::Running, TaskState::Completed)
        ]
    );
}

#[test]
fn test_task_cancellation_returns_solver() {
    let gate = Gate::closed();
    let g = chain(50);
    let solver = ShortestPaths::new(Arc::clone(&g), gated_weigher(&gate));
    let (tx, rx) = channel();
    let handle = SearchTask::new(solver, 0).batch_size(1).spawn(tx);
    handle.cancel();
    gate.open();

    let mut progress = Vec::new();
    let outcome = loop {
        match rx.recv().unwrap() {
            TaskEvent::Progress { snapshot, .. } => progress.push(snapshot),
            TaskEvent::Finished { outcome, .. } => break outcome,
        }
    };
    assert!(matches!(outcome, TaskOutcome::Cancelled), "{outcome:?}");
    // Cancellation lands on the first batch boundary at the latest.
    assert!(progress.len() <= 1);

    let mut solver = handle.join();
    assert!(!solver.all_paths_found());
    let snap = solver.find_all_paths(10);
    assert_eq!(snap.distance_to(0), Some(10));
}

#[test]
fn test_cancel_rolls_back_to_committed() {
    let gate = Gate::closed();
    gate.open();
    let g = chain(50);
    let solver = ShortestPaths::new(Arc::clone(&g), gated_weigher(&gate));
    let mut ctl = SearchController::new(solver).with_batch_size(1);

    ctl.start(0);
    ctl.wait();
    assert_eq!(ctl.state(), TaskState::Completed);
    let first = ctl.committed().unwrap().clone();
    let first_distances: Vec<_> = (0..50).map(|v| first.distance_to(v)).collect();

    gate.close();
    ctl.start(25);
    ctl.cancel();
    gate.open();
    let events = ctl.wait();

    assert_eq!(ctl.state(), TaskState::Cancelled);
    assert_eq!(
        states(&events).last(),
        Some(&(TaskState::Running, TaskState::Cancelled))
    );
    assert!(ctl.committed().unwrap().ptr_eq(&first));
    assert!(ctl.pending().unwrap().ptr_eq(&first));
    // The last pending notification is the rollback.
    assert!(snapshots(&events).last().unwrap().ptr_eq(&first));
    for (v, d) in first_distances.iter().enumerate() {
        assert_eq!(first.distance_to(v), *d);
    }
    // The controller is reusable after a cancel.
    ctl.start(49);
    ctl.wait();
    assert_eq!(ctl.state(), TaskState::Completed);
    assert_eq!(ctl.committed().unwrap().distance_to(0), Some(49));
}

#[test]
fn test_restart_suppresses_stale_events() {
    let gate = Gate::closed();
    let g = chain(30);
    let solver = ShortestPaths::new(Arc::clone(&g), gated_weigher(&gate));
    let mut ctl = SearchController::new(solver).with_batch_size(1);

    ctl.start(0);
    let first_generation = ctl.generation();
    // The first worker is stuck in its first batch until the gate opens.
    let opener = gate.open_after(Duration::from_millis(50));
    ctl.start(29);
    opener.join().unwrap();
    assert!(ctl.generation() > first_generation);
    let events = ctl.wait();

    assert_eq!(ctl.state(), TaskState::Completed);
    assert!(!states(&events)
        .iter()
        .any(|&(_, new)| new == TaskState::Cancelled));
    for snap in snapshots(&events) {
        assert_eq!(snap.start_id(), 29);
    }
    assert_eq!(ctl.committed().unwrap().distance_to(0), Some(29));
}

#[test]
fn test_reset_discards_running_search() {
    let gate = Gate::closed();
    let g = chain(30);
    let solver = ShortestPaths::new(Arc::clone(&g), gated_weigher(&gate));
    let mut ctl = SearchController::new(solver).with_batch_size(1);

    ctl.start(0);
    let opener = gate.open_after(Duration::from_millis(20));
    ctl.reset();
    opener.join().unwrap();

    assert_eq!(ctl.state(), TaskState::Idle);
    assert!(!ctl.is_running());
    let events = ctl.poll();
    assert!(snapshots(&events).is_empty());
    assert_eq!(ctl.state(), TaskState::Idle);
    assert!(ctl.committed().is_none());
    assert!(ctl.solver().is_some());
}

#[test]
fn test_panicking_weigher_surfaces_failure() {
    let g = chain(10);
    let weigher = |edge: &SimpleEdge| -> Weight {
        assert!(edge.end != 5, "no entry to vertex 5");
        edge.weight
    };
    let solver = ShortestPaths::new(Arc::clone(&g), weigher);
    let mut ctl = SearchController::new(solver).with_batch_size(2);
    ctl.start(0);
    let events = ctl.wait();

    assert_eq!(ctl.state(), TaskState::Failed);
    let failure = events
        .iter()
        .find_map(|e| match e {
            ControllerEvent::Failed(err) => Some(err.to_string()),
            _ => None,
        })
        .unwrap();
    assert!(failure.contains("no entry to vertex 5"), "{failure}");
    assert!(ctl.committed().is_none());
    assert!(ctl.solver().is_some());
}

/// Vertex 1 has an edge to a vertex that does not exist.
struct Broken;

impl Graph for Broken {
    type Edge = SimpleEdge;

    fn vertex_count(&self) -> usize {
        3
    }

    fn outgoing_edges(&self, id: VertexId) -> impl Iterator<Item = SimpleEdge> + '_ {
        let end = if id == 1 { 7 } else { id + 1 };
        (id < 2).then_some(SimpleEdge {
            start: id,
            end,
            weight: 1,
        })
        .into_iter()
    }
}

#[test]
fn test_out_of_bounds_edge_fails_task() {
    let (tx, rx) = channel();
    let handle = SearchTask::new(ShortestPaths::new(Broken, SimpleWeigher), 0)
        .batch_size(1)
        .generation(3)
        .spawn(tx);
    let finished = std::iter::from_fn(|| rx.recv().ok())
        .find(|e| matches!(e, TaskEvent::Finished { .. }))
        .unwrap();
    assert_eq!(finished.generation(), 3);
    match finished {
        TaskEvent::Finished {
            outcome: TaskOutcome::Failed(err),
            ..
        } => {
            let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
            assert!(chain.iter().any(|m| m.contains("edge 1->7 is out of bounds")), "{chain:?}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    handle.join();
}
