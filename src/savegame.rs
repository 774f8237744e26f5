//! Save game inspection
//!
//! Extracts the engine version, scenario name and playtime from a save
//! archive. The level stream format is undocumented; the decoder walks it in
//! a single pass and rejects anything that does not line up.
//!
//! ## Module Structure
//! - `types.rs`: Version, SaveDescriptor, TreeValue, SaveError
//! - `pure/`: Primitive reader and level stream decoder
//! - `operations.rs`: Zip container and zlib unwrapping

#[cfg(test)]
pub mod fixtures;
mod operations;
mod pure;
mod types;

// Re-export types
pub use types::{SaveDescriptor, SaveError, TICKS_PER_SECOND, TreeValue, Version};

// Re-export operations
pub use operations::{is_zlib_header, open_archive, open_save};

// Re-export pure functions
pub use pure::{DEFEAT_IMAGE_LANDMARK, decode_level};
