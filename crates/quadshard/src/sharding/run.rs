use std::path::PathBuf;

use chrono::NaiveDate;

use super::load::load_index;
use super::publish::publish_index;
use super::split::{SplitReport, Splitter};
use crate::core::{ShardIndex, ShardingConfig};
use crate::storage::ObjectStore;
use crate::utils::{write_file, Logger, ShardingResult};

/// Switches that shape a run but are not part of the stored configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Compute the new index without publishing it
    pub dry_run: bool,
    /// Also write a changed index to this local file
    pub keep_local: Option<PathBuf>,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: SplitReport,
    /// The index after splitting
    pub index: ShardIndex,
    /// Where the index was published, if it was
    pub published: Option<String>,
}

/// Load the index, split oversized shards and publish the result if
/// anything changed. Any storage failure ends the run before publishing.
pub fn run(
    store: &dyn ObjectStore,
    config: &ShardingConfig,
    options: &RunOptions,
    today: NaiveDate,
    logger: &Logger,
) -> ShardingResult<RunSummary> {
    let mut index = load_index(store, &config.index_path(), logger)?;

    logger.step(&format!("Listing shards under {}", config.input));
    let listing = store.list_objects_recursive(&config.input)?;
    logger.debug(&format!("{} objects listed", listing.len()));

    let report = Splitter::new(config.threshold_bytes(), logger)
        .with_shard_component(config.shard_component)
        .with_malformed_policy(config.malformed)
        .split(&mut index, &listing)?;

    if !report.changed() {
        logger.success(&format!(
            "No shard above {} MB needs splitting; index left unchanged",
            config.max_mb
        ));
        return Ok(RunSummary {
            report,
            index,
            published: None,
        });
    }

    if let Some(path) = &options.keep_local {
        write_file(path, index.to_text().as_bytes())?;
        logger.debug(&format!("Updated index written to {}", path.display()));
    }

    let published = if options.dry_run {
        logger.warning("Dry run: updated index not published");
        None
    } else {
        let destination = publish_index(store, &index, &config.utils, today, logger)?;
        logger.success(&format!(
            "Split {} shard(s); index published to {}",
            report.split.len(),
            destination
        ));
        Some(destination)
    };

    Ok(RunSummary {
        report,
        index,
        published,
    })
}
