use chrono::NaiveDate;

use crate::core::ShardIndex;
use crate::storage::ObjectStore;
use crate::utils::{Logger, ShardingResult};

/// `{prefix}sharding_quadtree_{YYYYMMDD}.txt`
pub fn publish_destination(prefix: &str, date: NaiveDate) -> String {
    format!("{}sharding_quadtree_{}.txt", prefix, date.format("%Y%m%d"))
}

/// Write the index under a new dated name. Earlier versions are left in
/// place. Returns the destination.
pub fn publish_index(
    store: &dyn ObjectStore,
    index: &ShardIndex,
    prefix: &str,
    date: NaiveDate,
    logger: &Logger,
) -> ShardingResult<String> {
    let destination = publish_destination(prefix, date);
    logger.step(&format!("Publishing {} index entries to {}", index.len(), destination));

    store.put_object(&destination, index.to_text().as_bytes())?;
    Ok(destination)
}
