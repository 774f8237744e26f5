//! Save archive I/O
//!
//! Opens the zip container, finds the level entry and unwraps the optional
//! zlib layer before handing the stream to the decoder.

use crate::savegame::pure::decode_level;
use crate::savegame::types::{SaveDescriptor, SaveError};
use flate2::read::ZlibDecoder;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Level entry names, in lookup order
const LEVEL_ENTRIES: [&str; 2] = ["level.dat0", "level.dat"];

/// Second header bytes that follow 0x78 in a zlib stream
const ZLIB_LEVEL_BYTES: [u8; 8] = [0x01, 0x5E, 0x9C, 0xDA, 0x20, 0x7D, 0xBB, 0xF9];

/// Check whether the first two bytes of an entry look like a zlib header
pub fn is_zlib_header(bytes: &[u8]) -> bool {
    matches!(bytes, [0x78, second, ..] if ZLIB_LEVEL_BYTES.contains(second))
}

/// Decode the save archive at `path`
pub fn open_save(path: &Path) -> Result<SaveDescriptor, SaveError> {
    let file = File::open(path)
        .map_err(|e| SaveError::Unsupported(format!("cannot open {}: {}", path.display(), e)))?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    open_archive(&mut archive)
}

/// Decode the level entry of an already opened archive
pub fn open_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<SaveDescriptor, SaveError> {
    let index = find_level_entry(archive)
        .ok_or_else(|| SaveError::Unsupported("level.dat not found".to_string()))?;

    let mut entry = archive.by_index(index)?;
    let mut raw = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut raw)
        .map_err(|e| SaveError::Unsupported(format!("cannot read {}: {}", entry.name(), e)))?;

    if is_zlib_header(&raw) {
        decode_level(ZlibDecoder::new(Cursor::new(raw)))
    } else {
        decode_level(Cursor::new(raw))
    }
}

/// Entries are matched by file name only; the game nests them under `<save name>/`
fn find_level_entry<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<usize> {
    LEVEL_ENTRIES.iter().find_map(|wanted| {
        archive
            .file_names()
            .find(|name| {
                Path::new(name)
                    .file_name()
                    .is_some_and(|f| f.to_string_lossy() == *wanted)
            })
            .and_then(|name| archive.index_for_name(name))
    })
}
