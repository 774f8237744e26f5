//! Pending change set
//!
//! Paths reported by the watcher wait here until the engine takes them.
//! Adding a path that is already pending is a no-op, so a burst of write
//! notifications for one save collapses into a single sync.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct ChangeQueue {
    pending: Mutex<HashSet<PathBuf>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        // The set stays consistent even if a holder panicked
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a path; returns false when it was already pending
    pub fn enqueue(&self, path: impl Into<PathBuf>) -> bool {
        self.lock().insert(path.into())
    }

    /// Discard a path; returns false when it was not pending
    pub fn remove(&self, path: &Path) -> bool {
        self.lock().remove(path)
    }

    /// Any pending path, or None when the queue is empty
    ///
    /// The path stays pending; the engine removes it once it has waited for
    /// exclusive access, so notifications that arrive while the file is still
    /// being written fold into this same occupancy.
    pub fn drain_one(&self) -> Option<PathBuf> {
        self.lock().iter().next().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
