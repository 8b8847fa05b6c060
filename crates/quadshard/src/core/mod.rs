pub mod config;
pub mod index;
pub mod shard_id;

pub use config::{ConfigLayer, MalformedPolicy, ShardingConfig};
pub use index::{IndexEntry, ShardIndex, Subdivision};
pub use shard_id::ShardId;
