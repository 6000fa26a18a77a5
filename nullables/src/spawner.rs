//! Nullable spawner: counts lane spawns.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nanpow_work::{LaneBody, LaneSpawner, ThreadSpawner, WorkError};

/// Wraps another [`LaneSpawner`] and counts how many lanes it started.
pub struct CountingSpawner {
    inner: Arc<dyn LaneSpawner>,
    spawned: AtomicUsize,
}

impl CountingSpawner {
    pub fn new(inner: Arc<dyn LaneSpawner>) -> Self {
        Self {
            inner,
            spawned: AtomicUsize::new(0),
        }
    }

    /// Count spawns onto dedicated threads.
    pub fn threads() -> Self {
        Self::new(Arc::new(ThreadSpawner))
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl LaneSpawner for CountingSpawner {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn spawn(&self, body: LaneBody) -> Result<(), WorkError> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        self.inner.spawn(body)
    }
}
