use crate::core::ShardIndex;
use crate::storage::ObjectStore;
use crate::utils::{Logger, ShardingError, ShardingResult};

/// Fetch the current index and parse it line by line
pub fn load_index(store: &dyn ObjectStore, path: &str, logger: &Logger) -> ShardingResult<ShardIndex> {
    logger.step(&format!("Fetching sharding index {}", path));

    let bytes = store.fetch_object(path)?;
    let text = String::from_utf8(bytes).map_err(|e| ShardingError::Fetch {
        path: path.to_string(),
        reason: format!("index is not valid UTF-8: {}", e),
    })?;

    let index = ShardIndex::parse(&text);
    logger.debug(&format!("Loaded {} index entries from {}", index.len(), path));
    Ok(index)
}
