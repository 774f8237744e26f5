// Pure functions for save synchronization
// No side effects - only comparison and path manipulation

use crate::savegame::{SaveDescriptor, Version};
use crate::util::is_staging_file;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const SAVE_EXTENSION: &str = "zip";

static BACKUP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)\[backup_(\d+)\.(\d+)\.(\d+)\]\.zip$").unwrap()
});

/// Save name of a path: its file name without extension
pub fn save_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

pub fn save_file_name(name: &str) -> String {
    format!("{}.{}", name, SAVE_EXTENSION)
}

/// The other file of the pair `path` belongs to
///
/// A path in the local saves directory pairs with the sync directory and the
/// other way around. Anything else has no counterpart.
pub fn counterpart_path(
    path: &Path,
    name: &str,
    saves_dir: &Path,
    sync_dir: &Path,
) -> Option<PathBuf> {
    if path.starts_with(saves_dir) {
        Some(sync_dir.join(save_file_name(name)))
    } else if path.starts_with(sync_dir) {
        Some(saves_dir.join(save_file_name(name)))
    } else {
        None
    }
}

/// Replace only when the changed side has strictly more playtime
pub fn should_replace(source: &SaveDescriptor, target: &SaveDescriptor) -> bool {
    source.playtime_seconds > target.playtime_seconds
}

/// Keep a copy of the target when a newer build of the same major.minor overwrites it
pub fn needs_backup(source: &SaveDescriptor, target: &SaveDescriptor) -> bool {
    target.version.is_older_same_major_minor(&source.version)
}

/// `<name>[backup_<major>.<minor>.<build>].zip`
pub fn backup_file_name(name: &str, version: &Version) -> String {
    format!("{}[backup_{}].{}", name, version.short(), SAVE_EXTENSION)
}

/// Backup path, next to the file it preserves
pub fn backup_path(target: &Path, name: &str, version: &Version) -> PathBuf {
    target.with_file_name(backup_file_name(name, version))
}

/// Split a backup file name into the save name and the preserved version
pub fn parse_backup_name(file_name: &str) -> Option<(String, Version)> {
    let caps = BACKUP_NAME.captures(file_name)?;
    let major = caps.get(2)?.as_str().parse().ok()?;
    let minor = caps.get(3)?.as_str().parse().ok()?;
    let build = caps.get(4)?.as_str().parse().ok()?;
    Some((
        caps.get(1)?.as_str().to_string(),
        Version::new(major, minor, build, 0),
    ))
}

/// True for `<name>.zip` files that are neither backups nor staging files
pub fn is_sync_candidate(path: &Path) -> bool {
    let Some(file_name) = path.file_name().map(|f| f.to_string_lossy()) else {
        return false;
    };
    path.extension().is_some_and(|ext| ext == SAVE_EXTENSION)
        && !is_staging_file(&file_name)
        && parse_backup_name(&file_name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save(build: u16, playtime_seconds: u64) -> SaveDescriptor {
        SaveDescriptor {
            version: Version::new(2, 0, build, 0),
            scenario: "freeplay".to_string(),
            playtime_seconds,
        }
    }

    #[test]
    fn counterpart_of_local_and_remote() {
        let saves = Path::new("/home/u/.factorio/saves");
        let sync = Path::new("/home/u/Cloud/factorio");
        assert_eq!(
            counterpart_path(&saves.join("base.zip"), "base", saves, sync),
            Some(sync.join("base.zip"))
        );
        assert_eq!(
            counterpart_path(&sync.join("base.zip"), "base", saves, sync),
            Some(saves.join("base.zip"))
        );
        assert_eq!(
            counterpart_path(Path::new("/tmp/base.zip"), "base", saves, sync),
            None
        );
    }

    #[test]
    fn containment_is_by_component() {
        let saves = Path::new("/data/saves");
        let sync = Path::new("/data/sync");
        // "/data/saves-old" shares a string prefix but is not inside "/data/saves"
        assert_eq!(
            counterpart_path(Path::new("/data/saves-old/a.zip"), "a", saves, sync),
            None
        );
    }

    #[test]
    fn replace_only_on_strictly_more_playtime() {
        assert!(should_replace(&save(1, 11), &save(1, 10)));
        assert!(!should_replace(&save(1, 10), &save(1, 10)));
        assert!(!should_replace(&save(9, 9), &save(1, 10)));
    }

    #[test]
    fn backup_only_for_older_build_in_same_line() {
        assert!(needs_backup(&save(30, 0), &save(28, 0)));
        assert!(!needs_backup(&save(28, 0), &save(28, 0)));
        assert!(!needs_backup(&save(27, 0), &save(28, 0)));

        let mut newer_minor = save(0, 0);
        newer_minor.version = Version::new(2, 1, 0, 0);
        assert!(!needs_backup(&newer_minor, &save(28, 0)));
    }

    #[test]
    fn backup_names() {
        let version = Version::new(2, 0, 28, 4071);
        assert_eq!(
            backup_file_name("megabase", &version),
            "megabase[backup_2.0.28].zip"
        );
        assert_eq!(
            backup_path(Path::new("/sync/megabase.zip"), "megabase", &version),
            PathBuf::from("/sync/megabase[backup_2.0.28].zip")
        );
        assert_eq!(
            parse_backup_name("megabase[backup_2.0.28].zip"),
            Some(("megabase".to_string(), Version::new(2, 0, 28, 0)))
        );
        assert_eq!(parse_backup_name("megabase.zip"), None);
        assert_eq!(parse_backup_name("megabase[backup_2.0].zip"), None);
    }

    #[test]
    fn sync_candidates() {
        assert!(is_sync_candidate(Path::new("/s/world.zip")));
        assert!(!is_sync_candidate(Path::new("/s/world[backup_1.1.110].zip")));
        assert!(!is_sync_candidate(Path::new("/s/.world.zip.Ab12Cd34.tmp")));
        assert!(!is_sync_candidate(Path::new("/s/world.dat")));
        assert!(!is_sync_candidate(Path::new("/s/world")));
    }

    #[test]
    fn names_from_paths() {
        assert_eq!(save_name(Path::new("/s/my save.zip")), Some("my save".to_string()));
        assert_eq!(save_file_name("my save"), "my save.zip");
    }
}
