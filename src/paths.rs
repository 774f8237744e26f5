use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

pub static PATH_HOME: LazyLock<PathBuf> =
    LazyLock::new(|| PathBuf::from(env::var("HOME").unwrap_or_else(|_| "/".to_string())));

pub static PATH_LOCAL_SHARE: LazyLock<PathBuf> = LazyLock::new(|| PATH_HOME.join(".local/share"));

pub static PATH_DATA: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Ok(xdg_data_home) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("savesync");
    }
    PATH_LOCAL_SHARE.join("savesync")
});

/// Where the game keeps its saves unless settings.json says otherwise
pub static PATH_SAVES_DEFAULT: LazyLock<PathBuf> = LazyLock::new(|| {
    // Flatpak installs keep the game's write directory under ~/.var
    let flatpak = PATH_HOME.join(".var/app/com.factorio.Factorio/.factorio/saves");
    if flatpak.exists() {
        flatpak
    } else {
        PATH_HOME.join(".factorio/saves")
    }
});

pub const SETTINGS_FILE: &str = "settings.json";
pub const MAPPINGS_FILE: &str = "mappings.json";

/// Expand ~ and $HOME in path
pub fn expand_path(path: &str) -> PathBuf {
    let mut s = path.to_string();
    if s.starts_with("~/") {
        s = s.replacen("~", &PATH_HOME.to_string_lossy(), 1);
    }
    s = s.replace("$HOME", &PATH_HOME.to_string_lossy());
    PathBuf::from(s)
}
