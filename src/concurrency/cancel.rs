//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

/// A shared, one-way "please stop" flag.
///
/// The worker polls it between batches; the controller raises it. Padded to its own cache
/// line so the polling thread does not contend with unrelated writes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<CachePadded<AtomicBool>>,
}

impl CancelFlag {
    /// Creates a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Idempotent.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
