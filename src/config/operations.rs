//! Configuration I/O
//!
//! settings.json and mappings.json both live in the data directory.

mod io;
mod mappings;

pub use io::{load_cfg, load_cfg_from, save_cfg, save_cfg_to};
pub use mappings::{MappingSource, MappingStore};
