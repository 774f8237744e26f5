// Atomic I/O operations for save synchronization
// Functions that interact with the filesystem

use crate::util::copy_atomic;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use super::pure::{is_sync_candidate, save_file_name, save_name};
use super::types::{
    ExecutionContext, LockAcquired, LockAttemptError, LockFailure, LockPolicy, PairStatus,
    SyncError,
};

/// One attempt at exclusive access to a file
pub trait LockProbe {
    fn try_exclusive(&self, path: &Path) -> Result<(), LockAttemptError>;
}

/// Opens the file and takes a non-blocking exclusive `flock`
///
/// The lock is dropped right away: holding it only proves no other writer
/// had the file at that moment.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlockProbe;

impl LockProbe for FlockProbe {
    fn try_exclusive(&self, path: &Path) -> Result<(), LockAttemptError> {
        let file = File::open(path).map_err(LockAttemptError::Terminal)?;
        try_flock_exclusive(&file)
    }
}

#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<(), LockAttemptError> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if ret == 0 {
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
        return Ok(());
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EWOULDBLOCK || code == libc::EINTR => {
            Err(LockAttemptError::Contended)
        }
        _ => Err(LockAttemptError::Terminal(err)),
    }
}

#[cfg(not(unix))]
fn try_flock_exclusive(_file: &File) -> Result<(), LockAttemptError> {
    Ok(())
}

/// Wait until no other process is writing `path`
///
/// Contention is retried after `policy.delay`, up to `policy.attempts` tries,
/// and only in the background context. Terminal failures end the wait at once.
pub fn wait_for_exclusive(
    probe: &dyn LockProbe,
    path: &Path,
    policy: &LockPolicy,
) -> Result<LockAcquired, LockFailure> {
    let max_attempts = match policy.context {
        ExecutionContext::Background => policy.attempts.max(1),
        ExecutionContext::Interactive => 1,
    };

    let mut attempt = 1;
    loop {
        match probe.try_exclusive(path) {
            Ok(()) => return Ok(LockAcquired { attempts: attempt }),
            Err(LockAttemptError::Terminal(e)) => return Err(LockFailure::Terminal(e)),
            Err(LockAttemptError::Contended) if attempt < max_attempts => {
                log::debug!(
                    "{} is busy (attempt {}/{}), waiting {:?}",
                    path.display(),
                    attempt,
                    max_attempts,
                    policy.delay
                );
                std::thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(LockAttemptError::Contended) => {
                return Err(LockFailure::Exhausted { attempts: attempt });
            }
        }
    }
}

impl LockFailure {
    pub fn into_sync_error(self, path: &Path) -> SyncError {
        match self {
            LockFailure::Exhausted { attempts } => SyncError::LockTimeout {
                path: path.to_path_buf(),
                attempts,
            },
            LockFailure::Terminal(source) => SyncError::Inaccessible {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Atomically replace `target` with the content of `source`
pub fn replace_file(source: &Path, target: &Path) -> Result<(), SyncError> {
    let bytes = copy_atomic(source, target).map_err(|source_err| SyncError::Io {
        path: target.to_path_buf(),
        source: source_err,
    })?;
    log::debug!(
        "Wrote {} bytes from {} to {}",
        bytes,
        source.display(),
        target.display()
    );
    Ok(())
}

/// Copy `target` to `backup` unless a backup with that name already exists
///
/// Returns the backup path when one was written.
pub fn backup_once(target: &Path, backup: &Path) -> io::Result<Option<PathBuf>> {
    if backup.exists() {
        log::info!("Backup {} already exists, keeping it", backup.display());
        return Ok(None);
    }
    copy_atomic(target, backup)?;
    Ok(Some(backup.to_path_buf()))
}

/// Compare the two copies of a save by presence and size
pub fn pair_status(name: &str, saves_dir: &Path, sync_dir: Option<&Path>) -> PairStatus {
    let Some(sync_dir) = sync_dir else {
        return PairStatus::Unconfigured;
    };
    if !sync_dir.is_dir() {
        return PairStatus::DirectoryMissing;
    }
    let file_name = save_file_name(name);
    let remote = std::fs::metadata(sync_dir.join(&file_name));
    let local = std::fs::metadata(saves_dir.join(&file_name));
    match (local, remote) {
        (Ok(l), Ok(r)) if l.len() == r.len() => PairStatus::Synchronized,
        _ => PairStatus::OutOfSync,
    }
}

/// Save names found directly inside `saves_dir`, sorted
pub fn list_saves(saves_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = walkdir::WalkDir::new(saves_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_sync_candidate(e.path()))
        .filter_map(|e| save_name(e.path()))
        .collect();
    names.sort();
    names
}
