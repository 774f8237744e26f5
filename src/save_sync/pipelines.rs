// Orchestration pipelines for save synchronization
// Combines pure logic and operations to keep both copies of a save current

use crate::config::MappingSource;
use crate::savegame::{SaveDescriptor, open_save};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::operations::{FlockProbe, LockProbe, backup_once, replace_file, wait_for_exclusive};
use super::pure::{
    backup_path, counterpart_path, needs_backup, save_file_name, save_name, should_replace,
};
use super::queue::ChangeQueue;
use super::types::{LockPolicy, SyncError, SyncOutcome, SyncReport};

/// Keeps the local saves directory and each save's sync directory consistent
///
/// The copy with more playtime wins. One engine should drain the queue at a
/// time; producers may keep enqueueing while it runs.
pub struct SyncEngine<M> {
    saves_dir: PathBuf,
    mappings: M,
    queue: Arc<ChangeQueue>,
    policy: LockPolicy,
    probe: Box<dyn LockProbe + Send>,
}

impl<M: MappingSource> SyncEngine<M> {
    pub fn new(saves_dir: PathBuf, mappings: M, queue: Arc<ChangeQueue>, policy: LockPolicy) -> Self {
        Self {
            saves_dir,
            mappings,
            queue,
            policy,
            probe: Box::new(FlockProbe),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn LockProbe + Send>) -> Self {
        self.probe = probe;
        self
    }

    pub fn queue(&self) -> &Arc<ChangeQueue> {
        &self.queue
    }

    pub fn saves_dir(&self) -> &Path {
        &self.saves_dir
    }

    /// Sync both copies of every configured save, in mapping order
    pub fn process_all(&self) -> SyncReport {
        let mut report = SyncReport::default();
        for (name, sync_dir) in self.mappings.entries() {
            let file_name = save_file_name(&name);
            for path in [self.saves_dir.join(&file_name), sync_dir.join(&file_name)] {
                let result = self.process_logged(&path);
                report.results.push((path, result));
            }
        }
        report
    }

    /// Sync every queued path until the queue is empty
    ///
    /// A failing path never stops the drain; its error goes into the report.
    /// `process_one` takes every path off the queue, so the loop ends; a path
    /// re-queued while it was being processed is processed again.
    pub fn process_queued(&self) -> SyncReport {
        let mut report = SyncReport::default();
        while let Some(path) = self.queue.drain_one() {
            let result = self.process_logged(&path);
            report.results.push((path, result));
        }
        report
    }

    fn process_logged(&self, path: &Path) -> Result<SyncOutcome, SyncError> {
        let result = self.process_one(path);
        match &result {
            Ok(SyncOutcome::Unconfigured) => {
                log::debug!("{} is not configured for sync", path.display())
            }
            Ok(SyncOutcome::UpToDate) => log::debug!("{} needs no sync", path.display()),
            Ok(_) => {}
            Err(e) => log::warn!("Sync failed: {}", e),
        }
        result
    }

    /// Sync the pair that `path` belongs to, treating `path` as the changed side
    pub fn process_one(&self, path: &Path) -> Result<SyncOutcome, SyncError> {
        // The change notification can fire while the game is still writing
        let lock = wait_for_exclusive(self.probe.as_ref(), path, &self.policy);

        // Taken for processing: never let this path block later drains
        self.queue.remove(path);

        let acquired = lock.map_err(|failure| failure.into_sync_error(path))?;
        if acquired.attempts > 1 {
            log::debug!(
                "Got exclusive access to {} after {} attempts",
                path.display(),
                acquired.attempts
            );
        }

        let Some(name) = save_name(path) else {
            return Err(SyncError::PathOutsideKnownRoots {
                path: path.to_path_buf(),
            });
        };
        let Some(sync_dir) = self.mappings.read(&name) else {
            return Ok(SyncOutcome::Unconfigured);
        };

        let target = counterpart_path(path, &name, &self.saves_dir, &sync_dir).ok_or_else(|| {
            SyncError::PathOutsideKnownRoots {
                path: path.to_path_buf(),
            }
        })?;

        // First sync: nothing to compare against
        if !target.exists() {
            log::info!("Copying {} -> {}", path.display(), target.display());
            replace_file(path, &target)?;
            return Ok(SyncOutcome::Seeded { target });
        }

        // Reading the remote copy may make the sync client download it
        let source_save = decode(path)?;
        let target_save = decode(&target)?;

        if !should_replace(&source_save, &target_save) {
            return Ok(SyncOutcome::UpToDate);
        }

        let mut backup = None;
        if needs_backup(&source_save, &target_save) {
            let backup_file = backup_path(&target, &name, &target_save.version);
            match backup_once(&target, &backup_file) {
                Ok(written) => {
                    if let Some(written) = &written {
                        log::info!(
                            "Backed up {} (version {}) to {}",
                            target.display(),
                            target_save.version.short(),
                            written.display()
                        );
                    }
                    backup = written;
                }
                Err(e) => {
                    // Backup failure shouldn't block the sync
                    log::warn!(
                        "Failed to back up {} to {}: {}",
                        target.display(),
                        backup_file.display(),
                        e
                    );
                }
            }
        }

        log::info!(
            "Replacing {} ({}s played) with {} ({}s played)",
            target.display(),
            target_save.playtime_seconds,
            path.display(),
            source_save.playtime_seconds
        );
        replace_file(path, &target)?;

        Ok(SyncOutcome::Replaced { target, backup })
    }
}

fn decode(path: &Path) -> Result<SaveDescriptor, SyncError> {
    open_save(path).map_err(|source| SyncError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
