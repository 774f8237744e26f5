use crate::paths::{PATH_SAVES_DEFAULT, expand_path};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration (settings.json)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Local saves directory; `~/` and `$HOME` are expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saves_dir: Option<String>,
    /// How many times to try for exclusive access to a save that is still being written
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,
    /// Delay between those attempts (milliseconds)
    #[serde(default = "default_lock_delay_ms")]
    pub lock_delay_ms: u64,
}

fn default_lock_attempts() -> u32 {
    10
}

fn default_lock_delay_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            saves_dir: None,
            lock_attempts: default_lock_attempts(),
            lock_delay_ms: default_lock_delay_ms(),
        }
    }
}

impl SyncConfig {
    pub fn saves_dir(&self) -> PathBuf {
        match &self.saves_dir {
            Some(dir) if !dir.is_empty() => expand_path(dir),
            _ => PATH_SAVES_DEFAULT.clone(),
        }
    }

    pub fn lock_delay(&self) -> Duration {
        Duration::from_millis(self.lock_delay_ms)
    }
}
