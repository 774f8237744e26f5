//! Save synchronization type definitions

use crate::savegame::SaveError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Where the engine is running
///
/// Only background work may sit in a retry loop waiting for another process
/// to finish writing a save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    Background,
    Interactive,
}

/// Bounded retry schedule for the exclusive-access probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub context: ExecutionContext,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(1),
            context: ExecutionContext::Background,
        }
    }
}

/// One failed probe, classified
#[derive(Debug)]
pub enum LockAttemptError {
    /// Another process holds the file; worth trying again
    Contended,
    /// Not found, bad path, access denied and similar; retrying will not help
    Terminal(io::Error),
}

/// Exclusive access was obtained on attempt number `attempts`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockAcquired {
    pub attempts: u32,
}

/// How waiting for exclusive access ended without success
#[derive(Debug)]
pub enum LockFailure {
    /// Every attempt hit contention
    Exhausted { attempts: u32 },
    /// A failure that no amount of waiting fixes
    Terminal(io::Error),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot get exclusive access to {path} after {attempts} attempt(s)")]
    LockTimeout { path: PathBuf, attempts: u32 },

    #[error("cannot read the file {path}: {source}")]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is neither in the saves directory nor in its sync directory")]
    PathOutsideKnownRoots { path: PathBuf },

    #[error("{path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: SaveError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What processing one path did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No sync directory is configured for this save
    Unconfigured,
    /// The other side did not exist and was created as a verbatim copy
    Seeded { target: PathBuf },
    /// The other side already has at least as much playtime
    UpToDate,
    /// The other side was overwritten, optionally after a backup
    Replaced {
        target: PathBuf,
        backup: Option<PathBuf>,
    },
}

/// Result of one pass over the queue or the mapping
#[derive(Debug, Default)]
pub struct SyncReport {
    pub results: Vec<(PathBuf, Result<SyncOutcome, SyncError>)>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &SyncError)> {
        self.results
            .iter()
            .filter_map(|(path, result)| result.as_ref().err().map(|e| (path, e)))
    }

    /// The failure the user should see; later failures supersede earlier ones
    pub fn last_failure(&self) -> Option<(&PathBuf, &SyncError)> {
        self.failures().last()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Comparison of the two copies of a save, without decoding them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairStatus {
    Unconfigured,
    DirectoryMissing,
    Synchronized,
    OutOfSync,
}

impl PairStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            PairStatus::Unconfigured => "not synchronized",
            PairStatus::DirectoryMissing => "sync directory does not exist",
            PairStatus::Synchronized => "synchronized",
            PairStatus::OutOfSync => "out of sync",
        }
    }
}
