//! Save name → sync directory mapping (mappings.json)
//!
//! The file is re-read on every lookup so that a running watcher sees
//! pairs added or removed by another invocation.

use crate::paths::{MAPPINGS_FILE, PATH_DATA, expand_path};
use crate::util::write_atomic;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Read-only view of the mapping used by the sync engine
pub trait MappingSource {
    /// Sync directory configured for a save name
    fn read(&self, name: &str) -> Option<PathBuf>;

    /// Every (name, directory) pair, sorted by name
    fn entries(&self) -> Vec<(String, PathBuf)>;
}

impl MappingSource for BTreeMap<String, PathBuf> {
    fn read(&self, name: &str) -> Option<PathBuf> {
        self.get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, PathBuf)> {
        self.iter().map(|(n, d)| (n.clone(), d.clone())).collect()
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct MappingFile {
    #[serde(default)]
    saves: BTreeMap<String, String>,
}

/// mappings.json in the data directory
#[derive(Clone, Debug)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(MAPPINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> MappingFile {
        let Ok(file) = File::open(&self.path) else {
            return MappingFile::default();
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(mappings) => mappings,
            Err(e) => {
                log::warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                MappingFile::default()
            }
        }
    }

    fn store(&self, mappings: &MappingFile) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(mappings)?;
        write_atomic(&self.path, |file| file.write_all(&json))?;
        Ok(())
    }

    /// Pair a save with a sync directory, replacing any previous pairing
    pub fn add(&self, name: &str, dir: &Path) -> Result<(), Box<dyn Error>> {
        if name.is_empty() {
            return Err("Save name must not be empty".into());
        }
        let mut mappings = self.load();
        mappings
            .saves
            .insert(name.to_string(), dir.to_string_lossy().to_string());
        self.store(&mappings)?;
        log::info!("Syncing '{}' with {}", name, dir.display());
        Ok(())
    }

    /// Forget a pairing; returns false when the name was not configured
    pub fn remove(&self, name: &str) -> Result<bool, Box<dyn Error>> {
        let mut mappings = self.load();
        if mappings.saves.remove(name).is_none() {
            return Ok(false);
        }
        self.store(&mappings)?;
        log::info!("Stopped syncing '{}'", name);
        Ok(true)
    }
}

impl Default for MappingStore {
    fn default() -> Self {
        Self::new(&PATH_DATA)
    }
}

impl MappingSource for MappingStore {
    fn read(&self, name: &str) -> Option<PathBuf> {
        self.load()
            .saves
            .get(name)
            .filter(|dir| !dir.is_empty())
            .map(|dir| expand_path(dir))
    }

    fn entries(&self) -> Vec<(String, PathBuf)> {
        self.load()
            .saves
            .into_iter()
            .filter(|(_, dir)| !dir.is_empty())
            .map(|(name, dir)| {
                let dir = expand_path(&dir);
                (name, dir)
            })
            .collect()
    }
}
