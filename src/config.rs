pub mod operations;
pub mod types;

// Re-export types
pub use types::SyncConfig;

// Re-export operations
pub use operations::{MappingSource, MappingStore, load_cfg, save_cfg};
