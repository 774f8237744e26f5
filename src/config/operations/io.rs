use crate::config::types::SyncConfig;
use crate::paths::{PATH_DATA, SETTINGS_FILE};
use crate::util::write_atomic;

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

pub fn load_cfg() -> SyncConfig {
    load_cfg_from(&PATH_DATA)
}

pub fn load_cfg_from(data_dir: &Path) -> SyncConfig {
    let path = data_dir.join(SETTINGS_FILE);

    if let Ok(file) = File::open(&path) {
        match serde_json::from_reader::<_, SyncConfig>(BufReader::new(file)) {
            Ok(config) => return config,
            Err(e) => log::warn!("Ignoring unreadable {}: {}", path.display(), e),
        }
    }

    // Return default settings if file doesn't exist or has error
    SyncConfig::default()
}

pub fn save_cfg(config: &SyncConfig) -> Result<(), Box<dyn Error>> {
    save_cfg_to(&PATH_DATA, config)
}

pub fn save_cfg_to(data_dir: &Path, config: &SyncConfig) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(data_dir)?;
    let json = serde_json::to_vec_pretty(config)?;
    write_atomic(&data_dir.join(SETTINGS_FILE), |file| file.write_all(&json))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_cfg_from(dir.path()), SyncConfig::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert_eq!(load_cfg_from(dir.path()), SyncConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested/data");
        let cfg = SyncConfig {
            saves_dir: Some("~/custom".to_string()),
            lock_attempts: 4,
            lock_delay_ms: 250,
        };
        save_cfg_to(&data_dir, &cfg).unwrap();
        assert_eq!(load_cfg_from(&data_dir), cfg);
    }
}
