use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Staging files are hidden and carry a random suffix: `.<file name>.<random>.tmp`
pub fn staging_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(8)
        .collect();
    target.with_file_name(format!(".{}.{}.tmp", file_name, suffix))
}

pub fn is_staging_file(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(".tmp")
}

/// Replace `target` in one step
///
/// `fill` writes the new content into a staging file next to the target; the
/// staging file is flushed to disk and renamed over the target. Readers see
/// either the old or the new file, also after a crash. On error the staging
/// file is removed and the target is left alone.
pub fn write_atomic<F>(target: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let staging = staging_path(target);

    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging)?;
        fill(&mut file)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&staging, target)?;
        sync_parent_dir(target);
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

/// Atomically replace `target` with a copy of `source`
pub fn copy_atomic(source: &Path, target: &Path) -> io::Result<u64> {
    let mut copied = 0;
    write_atomic(target, |file| {
        let mut src = File::open(source)?;
        copied = io::copy(&mut src, file)?;
        Ok(())
    })?;
    Ok(copied)
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        let dir = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            log::debug!("Could not sync directory {}: {}", dir.display(), e);
        }
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) {}

/// Playtime as `H:MM:SS`; hours keep counting past a day
pub fn format_playtime(seconds: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// Human readable file size, two decimals at most
pub fn format_file_size(bytes: u64) -> String {
    const SIZES: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exp = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < SIZES.len() {
        scaled /= 1024;
        exp += 1;
    }
    if exp >= SIZES.len() {
        return "Too large".to_string();
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZES[exp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn playtime_formatting() {
        assert_eq!(format_playtime(0), "0:00:00");
        assert_eq!(format_playtime(61), "0:01:01");
        assert_eq!(format_playtime(3600 * 30 + 5 * 60 + 9), "30:05:09");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(u64::MAX), "Too large");
    }

    #[test]
    fn staging_names_are_hidden_and_unique() {
        let target = Path::new("/saves/world.zip");
        let a = staging_path(target);
        let b = staging_path(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".world.zip."));
        assert!(is_staging_file(&name));
        assert!(!is_staging_file("world.zip"));
    }

    #[test]
    fn copy_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.zip");
        let dst = dir.path().join("dst.zip");
        fs::write(&src, b"new content").unwrap();
        fs::write(&dst, b"old").unwrap();

        assert_eq!(copy_atomic(&src, &dst).unwrap(), 11);
        assert_eq!(fs::read(&dst).unwrap(), b"new content");
        // No staging file left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn failed_write_keeps_target_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("dst.zip");
        fs::write(&dst, b"old").unwrap();

        let err = write_atomic(&dst, |file| {
            use std::io::Write;
            file.write_all(b"partial")?;
            Err(io::Error::other("interrupted"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "interrupted");
        assert_eq!(fs::read(&dst).unwrap(), b"old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_source_leaves_target() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("dst.zip");
        fs::write(&dst, b"old").unwrap();
        assert!(copy_atomic(&dir.path().join("nope.zip"), &dst).is_err());
        assert_eq!(fs::read(&dst).unwrap(), b"old");
    }
}
