pub mod filesystem;
pub mod observability;
pub mod validate;

// Re-export commonly used observability items for convenience
pub use observability::{LogLevel, Logger, ResultExt, ShardingError, ShardingResult};

pub use filesystem::{ensure_dir_exists, ensure_parent_dir_exists, write_file};
