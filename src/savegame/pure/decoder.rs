//! Level stream decoder
//!
//! One strict linear pass over the uncompressed level stream. Most fields are
//! read only to keep the cursor aligned; the pass keeps the version, the
//! scenario name and the tick counters.

use crate::savegame::pure::reader::SaveReader;
use crate::savegame::types::{SaveDescriptor, SaveError, TICKS_PER_SECOND, Version};
use std::io::{self, Read};

/// Resource path that always follows the settings padding
pub const DEFEAT_IMAGE_LANDMARK: &str = "__core__/graphics/defeat.png";

/// The only base mod this layout knows about
const BASE_MOD: &str = "base";

/// Consecutive zero bytes that end the padding after the settings tree
const PADDING_ZERO_RUN: usize = 4;

/// Decode a level stream into a `SaveDescriptor`
pub fn decode_level<R: Read>(stream: R) -> Result<SaveDescriptor, SaveError> {
    let mut reader = SaveReader::new(stream);

    let version = reader
        .read_full_version()
        .map_err(|e| SaveError::Unsupported(format!("cannot read game version: {}", e)))?;
    if version.major < 2 {
        return Err(SaveError::Unsupported(format!(
            "game version {} is too old",
            version
        )));
    }

    let parsing = |e: io::Error| SaveError::Parsing {
        version,
        detail: e.to_string(),
    };

    let _quality_version = reader.read_u8().map_err(parsing)?;
    let _campaign = reader.read_string_u8_len().map_err(parsing)?;
    let scenario = reader.read_string_u8_len().map_err(parsing)?;
    let base_mod = if version.major >= 2 {
        reader.read_string_u8_len().map_err(parsing)?
    } else {
        BASE_MOD.to_string()
    };
    if base_mod != BASE_MOD {
        return Err(SaveError::Parsing {
            version,
            detail: format!("unexpected base mod '{}'", base_mod),
        });
    }

    skip_header_fields(&mut reader).map_err(parsing)?;
    skip_mods(&mut reader).map_err(parsing)?;

    reader.skip(4).map_err(parsing)?;
    let _settings = reader.read_tree_value().map_err(parsing)?;
    reader
        .skip_until_zero_run(PADDING_ZERO_RUN)
        .map_err(parsing)?;

    let landmark = reader.read_string_u8_len().map_err(parsing)?;
    if landmark != DEFEAT_IMAGE_LANDMARK {
        return Err(SaveError::Parsing {
            version,
            detail: format!("unexpected layout, found '{}' instead of the defeat image", landmark),
        });
    }
    reader.skip(1).map_err(parsing)?;

    let (update_tick, entity_tick, ticks_played) =
        read_ticks(&mut reader, &version).map_err(parsing)?;
    if update_tick != entity_tick || entity_tick != ticks_played {
        return Err(SaveError::Desync {
            update_tick,
            entity_tick,
            ticks_played,
        });
    }

    Ok(SaveDescriptor {
        version,
        scenario,
        playtime_seconds: ticks_played / TICKS_PER_SECOND,
    })
}

/// Difficulty, game state flags, "loaded from" version and allowed commands
fn skip_header_fields<R: Read>(reader: &mut SaveReader<R>) -> io::Result<()> {
    let _difficulty = reader.read_u8()?;
    let _finished = reader.read_bool()?;
    let _won = reader.read_bool()?;
    let _next_level = reader.read_string_u8_len()?;
    let _can_continue = reader.read_bool()?;
    let _finished_but_continuing = reader.read_bool()?;
    let _saving_replay = reader.read_bool()?;
    let _allow_non_admin_debug = reader.read_bool()?;
    let _loaded_from = reader.read_short_version()?;
    let _loaded_from_build = reader.read_u32()?;
    let _allowed_commands = reader.read_u8()?;
    reader.skip(4)
}

fn skip_mods<R: Read>(reader: &mut SaveReader<R>) -> io::Result<()> {
    let count = reader.read_optim_u32()?;
    for _ in 0..count {
        let _name = reader.read_string_u8_len()?;
        let _version = reader.read_short_version()?;
        let _crc = reader.read_u32()?;
    }
    Ok(())
}

fn read_ticks<R: Read>(reader: &mut SaveReader<R>, version: &Version) -> io::Result<(u64, u64, u64)> {
    let mut read_tick = || -> io::Result<u64> {
        if version.major >= 2 {
            reader.read_u64()
        } else {
            reader.read_u32().map(u64::from)
        }
    };
    let update_tick = read_tick()?;
    let entity_tick = read_tick()?;
    let ticks_played = read_tick()?;
    Ok((update_tick, entity_tick, ticks_played))
}
