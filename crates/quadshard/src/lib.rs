// Quadshard - quadtree sharding index maintenance for tiled datasets

// Core modules
pub mod core;
pub mod sharding;
pub mod storage;
pub mod utils;

// CLI handling
pub mod cli;

// Re-export common types and functions for convenience
pub use crate::core::{IndexEntry, ShardId, ShardIndex, ShardingConfig};
pub use sharding::{run, RunOptions, RunSummary};
pub use storage::{AwsCliStore, MemoryStore, ObjectStore};
pub use utils::{Logger, ShardingError, ShardingResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
