//! Save game type definitions

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Engine tick rate; 60 ticks make one second of playtime
pub const TICKS_PER_SECOND: u64 = 60;

/// Engine version stored at the head of every level stream
///
/// Ordering only looks at (major, minor, build). The revision is kept for
/// display and is never compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// True when both versions share major.minor and `self` has a lower build
    ///
    /// This is the only version relation that triggers a backup before a save
    /// is overwritten.
    pub fn is_older_same_major_minor(&self, newer: &Version) -> bool {
        self.major == newer.major && self.minor == newer.minor && self.build < newer.build
    }

    /// `major.minor.build`, as used in backup file names
    pub fn short(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// The three facts extracted from a save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveDescriptor {
    pub version: Version,
    pub scenario: String,
    pub playtime_seconds: u64,
}

/// Settings blob embedded in the level stream
///
/// The decoder reads it only to stay aligned; nothing downstream looks inside.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeValue {
    Null,
    Bool(bool),
    Int(i32),
    Text(String),
    List(Vec<TreeValue>),
    Map(BTreeMap<String, TreeValue>),
}

#[derive(Error, Debug)]
pub enum SaveError {
    /// No version could be read, the version is too old, or the archive has no level entry
    #[error("unsupported save: {0}")]
    Unsupported(String),

    /// The header was understood but a later layout assumption broke
    #[error("cannot parse save of version {version}: {detail}")]
    Parsing { version: Version, detail: String },

    /// The three tick counters disagree
    #[error(
        "the game is in a desync state (update tick {update_tick}, entity tick {entity_tick}, ticks played {ticks_played})"
    )]
    Desync {
        update_tick: u64,
        entity_tick: u64,
        ticks_played: u64,
    },
}

impl SaveError {
    /// Version read from the header, when decoding got that far
    pub fn version(&self) -> Option<Version> {
        match self {
            SaveError::Parsing { version, .. } => Some(*version),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for SaveError {
    fn from(e: zip::result::ZipError) -> Self {
        SaveError::Unsupported(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u16, minor: u16, build: u16) -> Version {
        Version::new(major, minor, build, 0)
    }

    #[test]
    fn older_same_major_minor() {
        assert!(v(1, 2, 3).is_older_same_major_minor(&v(1, 2, 5)));
        assert!(!v(1, 3, 0).is_older_same_major_minor(&v(1, 2, 9)));
        assert!(!v(2, 0, 0).is_older_same_major_minor(&v(1, 9, 9)));
        // Different minor is never a backup trigger, even if older
        assert!(!v(1, 1, 9).is_older_same_major_minor(&v(1, 2, 0)));
        assert!(!v(1, 2, 5).is_older_same_major_minor(&v(1, 2, 5)));
    }

    #[test]
    fn revision_never_triggers_a_backup() {
        let a = Version::new(2, 0, 28, 1);
        let b = Version::new(2, 0, 28, 77);
        assert!(!a.is_older_same_major_minor(&b));
        assert!(!b.is_older_same_major_minor(&a));
    }

    #[test]
    fn display_formats() {
        let ver = Version::new(2, 0, 28, 4071);
        assert_eq!(ver.to_string(), "2.0.28-4071");
        assert_eq!(ver.short(), "2.0.28");
    }

    #[test]
    fn parsing_error_carries_version() {
        let ver = v(2, 0, 7);
        let err = SaveError::Parsing {
            version: ver,
            detail: "unexpected base mod".to_string(),
        };
        assert_eq!(err.version(), Some(ver));
        assert_eq!(SaveError::Unsupported("x".into()).version(), None);
    }
}
