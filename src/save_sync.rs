//! Save synchronization between the local saves directory and sync directories
//!
//! Every configured save exists twice: `<saves_dir>/<name>.zip` and
//! `<sync_dir>/<name>.zip`, where the sync directory is usually inside a
//! cloud-synced folder. Whenever one side changes, the copy with more playtime
//! overwrites the other.
//!
//! ## Module Structure
//! - `types.rs`: LockPolicy, ExecutionContext, SyncError, SyncOutcome, SyncReport, PairStatus
//! - `queue.rs`: ChangeQueue, the deduplicating set of pending paths
//! - `pure.rs`: Pure functions (pairing, replace and backup decisions, naming)
//! - `operations.rs`: Atomic I/O operations (lock probe, replace, backup, status)
//! - `pipelines.rs`: SyncEngine (process_one, process_all, process_queued)

mod operations;
mod pipelines;
mod pure;
mod queue;
mod types;

// Re-export types
pub use types::{
    ExecutionContext, LockAcquired, LockAttemptError, LockFailure, LockPolicy, PairStatus,
    SyncError, SyncOutcome, SyncReport,
};

pub use queue::ChangeQueue;

// Re-export operations
pub use operations::{
    FlockProbe, LockProbe, backup_once, list_saves, pair_status, replace_file, wait_for_exclusive,
};

// Re-export pipelines
pub use pipelines::SyncEngine;

// Re-export pure functions
pub use pure::{
    SAVE_EXTENSION, backup_file_name, backup_path, counterpart_path, is_sync_candidate,
    needs_backup, parse_backup_name, save_file_name, save_name, should_replace,
};
