//! Pure decoding for the level stream
//!
//! Nothing here touches the filesystem; callers hand in any `Read`.

mod decoder;
pub mod reader;

pub use decoder::{DEFEAT_IMAGE_LANDMARK, decode_level};
