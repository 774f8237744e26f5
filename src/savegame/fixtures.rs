//! Synthetic saves for tests
//!
//! `LevelBuilder` writes a level stream field by field in the same order the
//! decoder reads it; `write_save_zip` wraps a stream in a zip archive.

use crate::savegame::pure::DEFEAT_IMAGE_LANDMARK;
use crate::savegame::types::Version;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

#[derive(Clone, Debug)]
pub struct LevelBuilder {
    pub version: Version,
    pub scenario: String,
    pub base_mod: String,
    pub landmark: String,
    pub mods: Vec<(String, Version)>,
    pub update_tick: u64,
    pub entity_tick: u64,
    pub ticks_played: u64,
    /// Garbage written after the settings tree, before the zero run
    pub padding: Vec<u8>,
}

impl LevelBuilder {
    pub fn new(version: Version, ticks: u64) -> Self {
        Self {
            version,
            scenario: "freeplay".to_string(),
            base_mod: "base".to_string(),
            landmark: DEFEAT_IMAGE_LANDMARK.to_string(),
            mods: vec![("base".to_string(), Version::new(2, 0, 28, 0))],
            update_tick: ticks,
            entity_tick: ticks,
            ticks_played: ticks,
            padding: vec![0x11, 0, 0x22],
        }
    }

    fn u8_str(out: &mut Vec<u8>, s: &str) {
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }

    fn optim16(out: &mut Vec<u8>, v: u16) {
        if v < 0xFF {
            out.push(v as u8);
        } else {
            out.push(0xFF);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn short_version(out: &mut Vec<u8>, v: &Version) {
        Self::optim16(out, v.major);
        Self::optim16(out, v.minor);
        Self::optim16(out, v.build);
    }

    fn immutable(out: &mut Vec<u8>, s: &str) {
        out.push(0);
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }

    pub fn build(&self) -> Vec<u8> {
        let v = &self.version;
        let mut out = Vec::new();
        for part in [v.major, v.minor, v.build, v.revision] {
            out.extend_from_slice(&part.to_le_bytes());
        }
        out.push(0); // quality version
        Self::u8_str(&mut out, "");
        Self::u8_str(&mut out, &self.scenario);
        if v.major >= 2 {
            Self::u8_str(&mut out, &self.base_mod);
        }
        out.push(1); // difficulty
        out.extend_from_slice(&[0, 0]); // finished, won
        Self::u8_str(&mut out, "");
        out.extend_from_slice(&[1, 0, 0, 0]); // continue, finished-but-continuing, replay, debug
        Self::short_version(&mut out, v);
        out.extend_from_slice(&(v.revision as u32).to_le_bytes());
        out.push(1); // allowed commands
        out.extend_from_slice(&[0xAA; 4]);
        let mod_count = self.mods.len() as u32;
        if mod_count < 0xFF {
            out.push(mod_count as u8);
        } else {
            out.push(0xFF);
            out.extend_from_slice(&mod_count.to_le_bytes());
        }
        for (name, ver) in &self.mods {
            Self::u8_str(&mut out, name);
            Self::short_version(&mut out, ver);
            out.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        }
        out.extend_from_slice(&7i32.to_le_bytes());

        // settings tree: { "seed": 12345, "peaceful": false, "tags": ["a"] }
        out.extend_from_slice(&[5, 0, 3]);
        Self::immutable(&mut out, "seed");
        out.extend_from_slice(&[2, 0]);
        out.extend_from_slice(&12345i32.to_le_bytes());
        Self::immutable(&mut out, "peaceful");
        out.extend_from_slice(&[1, 0, 0]);
        Self::immutable(&mut out, "tags");
        out.extend_from_slice(&[4, 0, 1]);
        out.push(1); // absent key
        out.extend_from_slice(&[3, 0]);
        Self::immutable(&mut out, "a");

        out.extend_from_slice(&self.padding);
        out.extend_from_slice(&[0, 0, 0, 0]);
        Self::u8_str(&mut out, &self.landmark);
        out.push(0);

        for tick in [self.update_tick, self.entity_tick, self.ticks_played] {
            if v.major >= 2 {
                out.extend_from_slice(&tick.to_le_bytes());
            } else {
                out.extend_from_slice(&(tick as u32).to_le_bytes());
            }
        }
        out.extend_from_slice(&[0x5A; 16]); // rest of the level, never read
        out
    }
}

/// Deflate a level stream with a zlib header
pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

/// Write a zip archive holding `entries` (name, content), stored uncompressed
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a save archive the way the game lays it out: `<name>/level.dat0`, zlib-compressed
pub fn write_save_zip(path: &Path, level: &LevelBuilder) {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "save".to_string());
    let entry = format!("{}/level.dat0", name);
    let control = format!("{}/control.lua", name);
    let compressed = zlib(&level.build());
    write_zip(
        path,
        &[
            (entry.as_str(), compressed.as_slice()),
            (control.as_str(), b"-- scenario".as_slice()),
        ],
    );
}

/// Shorthand: a 2.0.x save with the given build and ticks
pub fn save_zip(path: &Path, build: u16, ticks: u64) {
    write_save_zip(path, &LevelBuilder::new(Version::new(2, 0, build, 0), ticks));
}
