//! Process-wide list of live producer rings.
//!
//! Producers publish their ring here on first use; the sink thread walks the
//! list on every drain pass. The list is append-only during steady state, so
//! registration order is stable and a ring is drained even after its owning
//! thread has exited.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::ring::RingBuffer;

/// Registry of every ring a producer thread has allocated.
#[derive(Default)]
pub struct BufferRegistry {
    buffers: Mutex<Vec<Arc<RingBuffer>>>,
}

impl BufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a ring under the registry lock.
    pub fn register(&self, ring: Arc<RingBuffer>) {
        self.buffers.lock().push(ring);
    }

    /// Number of registered rings.
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the list for one drain pass.
    ///
    /// The guard is held while the sink copies from every ring in
    /// registration order and released between passes, so first-time
    /// registration only ever waits for at most one pass.
    pub fn lock(&self) -> MutexGuard<'_, Vec<Arc<RingBuffer>>> {
        self.buffers.lock()
    }

    /// Drop every registered ring. Teardown only.
    pub fn clear(&self) {
        self.buffers.lock().clear();
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
