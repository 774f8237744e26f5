//! Change notifications and the background sync worker
//!
//! A `notify` watcher reports writes to `<name>.zip` in the saves directory
//! and in every mapped sync directory. Reported paths go on the change queue
//! and wake the single worker thread, which drains the queue through the
//! sync engine. One worker means one drain at a time.
//!
//! The watched set follows mappings.json, so pairs added or removed by
//! another invocation take effect without a restart.

use crate::config::MappingSource;
use crate::save_sync::{ChangeQueue, SyncEngine, SyncReport, is_sync_candidate, save_name};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Save files touched by an event; everything else is dropped
pub fn changed_saves(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => event
            .paths
            .iter()
            .filter(|p| is_sync_candidate(p))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Directories to watch: the saves directory plus each existing sync directory
pub fn watched_dirs(saves_dir: &Path, mappings: &impl MappingSource) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();
    dirs.insert(saves_dir.to_path_buf());
    for (name, dir) in mappings.entries() {
        if dir.is_dir() {
            dirs.insert(dir);
        } else {
            log::warn!(
                "Sync directory {} for '{}' does not exist, not watching it",
                dir.display(),
                name
            );
        }
    }
    dirs.into_iter().collect()
}

/// Watches the save directories and follows changes to the mapping file
///
/// The data directory holding mappings.json is watched too. When the file
/// changes, directories of added pairs start being watched and directories
/// no pair uses any more are dropped.
pub struct SaveWatcher<M> {
    watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    saves_dir: PathBuf,
    mappings_file: PathBuf,
    mappings: M,
    watched: BTreeSet<PathBuf>,
    queue: Arc<ChangeQueue>,
    wake: Sender<()>,
}

impl<M: MappingSource> SaveWatcher<M> {
    pub fn new(
        saves_dir: &Path,
        mappings_file: &Path,
        mappings: M,
        queue: Arc<ChangeQueue>,
        wake: Sender<()>,
    ) -> Result<Self, Box<dyn Error>> {
        if let Some(data_dir) = mappings_file.parent() {
            std::fs::create_dir_all(data_dir)?;
        }
        let (tx, events) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        let mut save_watcher = Self {
            watcher,
            events,
            saves_dir: saves_dir.to_path_buf(),
            mappings_file: mappings_file.to_path_buf(),
            mappings,
            watched: BTreeSet::new(),
            queue,
            wake,
        };
        save_watcher.refresh();
        Ok(save_watcher)
    }

    /// Directories currently watched
    pub fn watched(&self) -> &BTreeSet<PathBuf> {
        &self.watched
    }

    /// Watch exactly the directories the mapping uses right now
    pub fn refresh(&mut self) {
        let mut wanted: BTreeSet<PathBuf> = watched_dirs(&self.saves_dir, &self.mappings)
            .into_iter()
            .collect();
        if let Some(data_dir) = self.mappings_file.parent() {
            wanted.insert(data_dir.to_path_buf());
        }

        let stale: Vec<PathBuf> = self.watched.difference(&wanted).cloned().collect();
        for dir in stale {
            if let Err(e) = self.watcher.unwatch(&dir) {
                log::debug!("Could not unwatch {}: {}", dir.display(), e);
            }
            self.watched.remove(&dir);
            log::info!("Stopped watching {}", dir.display());
        }

        let added: Vec<PathBuf> = wanted.difference(&self.watched).cloned().collect();
        for dir in added {
            match self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    log::info!("Watching {}", dir.display());
                    self.watched.insert(dir);
                }
                Err(e) => log::warn!("Cannot watch {}: {}", dir.display(), e),
            }
        }
    }

    /// Queue the mapped saves an event touched, or re-read the mapping
    pub fn handle(&mut self, event: &Event) {
        if event.paths.iter().any(|p| p == &self.mappings_file) {
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                log::debug!("{} changed", self.mappings_file.display());
                self.refresh();
            }
            return;
        }

        let mut queued = false;
        for path in changed_saves(event) {
            let mapped = save_name(&path).is_some_and(|name| self.mappings.read(&name).is_some());
            if mapped && self.queue.enqueue(path.clone()) {
                log::debug!("Queued {}", path.display());
                queued = true;
            }
        }
        if queued {
            // Worker gone means we are shutting down
            let _ = self.wake.send(());
        }
    }

    fn dispatch(&mut self, res: notify::Result<Event>) {
        match res {
            Ok(event) => self.handle(&event),
            Err(e) => log::warn!("Watch error: {}", e),
        }
    }

    /// Handle at most one event; false when none arrived within `timeout`
    pub fn handle_next(&mut self, timeout: Duration) -> bool {
        match self.events.recv_timeout(timeout) {
            Ok(res) => {
                self.dispatch(res);
                true
            }
            Err(_) => false,
        }
    }

    /// Handle events for as long as the process runs
    pub fn run(mut self) {
        while let Ok(res) = self.events.recv() {
            self.dispatch(res);
        }
    }
}

/// Thread that owns the sync engine
pub struct SyncWorker {
    wake: Sender<()>,
    handle: JoinHandle<()>,
}

impl SyncWorker {
    /// Run a full scan, then drain the queue on every wake-up
    pub fn spawn<M>(engine: SyncEngine<M>) -> std::io::Result<Self>
    where
        M: MappingSource + Send + 'static,
    {
        let (wake, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("sync-worker".to_string())
            .spawn(move || run_worker(engine, rx))?;
        Ok(Self { wake, handle })
    }

    /// Sender for producers that want the queue drained
    pub fn waker(&self) -> Sender<()> {
        self.wake.clone()
    }

    /// Stop after the current drain; waits for the thread to finish
    ///
    /// The thread exits once every waker, including those handed out, is gone.
    pub fn shutdown(self) {
        drop(self.wake);
        if self.handle.join().is_err() {
            log::error!("Sync worker panicked");
        }
    }
}

fn run_worker<M: MappingSource>(engine: SyncEngine<M>, rx: Receiver<()>) {
    log_report("Initial sync", &engine.process_all());

    while rx.recv().is_ok() {
        // Collapse wake-ups that piled up during the previous drain
        while rx.try_recv().is_ok() {}
        log_report("Sync", &engine.process_queued());
    }
    log::debug!("Sync worker stopped");
}

fn log_report(what: &str, report: &SyncReport) {
    let failures = report.failures().count();
    if let Some((path, e)) = report.last_failure() {
        log::error!(
            "{}: {} of {} path(s) failed; last error on {}: {}",
            what,
            failures,
            report.results.len(),
            path.display(),
            e
        );
    } else if !report.results.is_empty() {
        log::info!("{}: {} path(s) processed", what, report.results.len());
    }
}
