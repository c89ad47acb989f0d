//! Decrease-key min priority queue over distinct keys.
//!
//! The queue is a binary min-heap of `(key, priority)` entries paired with a hash
//! index from each key to its slot in the heap. The index lets [`MinQueue::add_or_update`]
//! find an already-queued key in O(1) and move it in place, so a key is never present
//! twice; Dijkstra relies on this to keep exactly one frontier entry per vertex.
//!
//! ### Invariants
//! - `priority(parent(i)) <= priority(i)` for every non-root slot `i`.
//! - `index[heap[i].key] == i` for every slot, and `index.len() == heap.len()`.
//!
//! Both are re-checked after every mutation in debug builds.
//!
//! ### Performance Characteristics
//! | Operation | Complexity |
//! |-----------|------------|
//! | `add_or_update` | \(O(\log n)\) insert or reprioritize |
//! | `peek` / `get` / `min_priority` | \(O(1)\) |
//! | `pop` / `remove` | \(O(\log n)\) |
//! | `contains` / `priority` | \(O(1)\) expected |

use core::fmt;
use core::hash::Hash;
use std::collections::HashMap;

#[derive(Clone)]
struct Entry<K, P> {
    key: K,
    priority: P,
}

/// A min priority queue of distinct keys with extrinsic priorities.
///
/// Ties between equal priorities are broken arbitrarily.
#[derive(Clone)]
pub struct MinQueue<K, P = u64> {
    heap: Vec<Entry<K, P>>,
    index: HashMap<K, usize>,
}

impl<K, P> MinQueue<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates an empty queue with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of keys in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the queue holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` if `key` is queued.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the priority currently associated with `key`, if queued.
    pub fn priority(&self, key: &K) -> Option<P> {
        self.index.get(key).map(|&slot| self.heap[slot].priority)
    }

    /// Returns a minimum-priority key and its priority without removing it.
    pub fn peek(&self) -> Option<(&K, P)> {
        self.heap.first().map(|e| (&e.key, e.priority))
    }

    /// Returns a minimum-priority key; the same key [`remove`](Self::remove) would return.
    ///
    /// # Panics
    /// Panics if the queue is empty.
    pub fn get(&self) -> &K {
        match self.heap.first() {
            Some(entry) => &entry.key,
            None => panic!("get() called on an empty queue"),
        }
    }

    /// Returns the smallest priority in the queue.
    ///
    /// # Panics
    /// Panics if the queue is empty.
    pub fn min_priority(&self) -> P {
        match self.heap.first() {
            Some(entry) => entry.priority,
            None => panic!("min_priority() called on an empty queue"),
        }
    }

    /// Inserts `key` with `priority`, or changes the priority of `key` if it is already
    /// queued. The new priority may be lower or higher than the old one.
    pub fn add_or_update(&mut self, key: K, priority: P) {
        match self.index.get(&key) {
            Some(&slot) => self.update(slot, priority),
            None => self.add(key, priority),
        }
        debug_assert!(self.check_invariant());
    }

    /// Removes and returns a minimum-priority key together with its priority.
    pub fn pop(&mut self) -> Option<(K, P)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop()?;
        self.index.remove(&entry.key);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        debug_assert!(self.check_invariant());
        Some((entry.key, entry.priority))
    }

    /// Removes and returns a minimum-priority key.
    ///
    /// # Panics
    /// Panics if the queue is empty.
    pub fn remove(&mut self) -> K {
        match self.pop() {
            Some((key, _)) => key,
            None => panic!("remove() called on an empty queue"),
        }
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// Iterates over queued keys and priorities in heap (not priority) order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, P)> + '_ {
        self.heap.iter().map(|e| (&e.key, e.priority))
    }

    /// Verifies the heap ordering and that the index mirrors heap slots exactly.
    ///
    /// Cheap enough for tests and debug assertions, linear in the queue size.
    pub fn check_invariant(&self) -> bool {
        if self.index.len() != self.heap.len() {
            return false;
        }
        self.heap.iter().enumerate().all(|(i, entry)| {
            let ordered = i == 0 || self.heap[(i - 1) / 2].priority <= entry.priority;
            ordered && self.index.get(&entry.key) == Some(&i)
        })
    }

    fn add(&mut self, key: K, priority: P) {
        debug_assert!(!self.index.contains_key(&key));
        let slot = self.heap.len();
        self.index.insert(key.clone(), slot);
        self.heap.push(Entry { key, priority });
        self.sift_up(slot);
    }

    fn update(&mut self, slot: usize, priority: P) {
        let old = core::mem::replace(&mut self.heap[slot].priority, priority);
        if priority < old {
            self.sift_up(slot);
        } else {
            self.sift_down(slot);
        }
    }

    /// Moves the entry at `node` toward the root while it is smaller than its parent.
    fn sift_up(&mut self, mut node: usize) {
        while node > 0 {
            let parent = (node - 1) / 2;
            if self.heap[node].priority < self.heap[parent].priority {
                self.swap(parent, node);
                node = parent;
            } else {
                break;
            }
        }
    }

    /// Moves the entry at `node` toward the leaves while a child is smaller.
    fn sift_down(&mut self, mut node: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * node + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut smaller = left;
            if right < len && self.heap[right].priority < self.heap[left].priority {
                smaller = right;
            }

            if self.heap[smaller].priority < self.heap[node].priority {
                self.swap(node, smaller);
                node = smaller;
            } else {
                break;
            }
        }
    }

    /// Swaps two heap slots and re-points both keys in the index.
    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        if let Some(slot) = self.index.get_mut(&self.heap[a].key) {
            *slot = a;
        }
        if let Some(slot) = self.index.get_mut(&self.heap[b].key) {
            *slot = b;
        }
    }
}

impl<K, P> Default for MinQueue<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> fmt::Debug for MinQueue<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinQueue")
            .field("len", &self.heap.len())
            .finish()
    }
}
