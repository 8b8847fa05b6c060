//! Splitting oversized shards into their quadtree children.

use crate::core::shard_id::DEFAULT_SHARD_COMPONENT;
use crate::core::{MalformedPolicy, ShardId, ShardIndex, Subdivision};
use crate::storage::ListingEntry;
use crate::utils::{Logger, ShardingError, ShardingResult};

/// What one pass over the listing did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Listed objects above the threshold
    pub oversized: usize,
    /// Shards tombstoned during this pass, in listing order
    pub split: Vec<ShardId>,
    /// Oversized shards with no live index entry
    pub unmatched: Vec<ShardId>,
    /// Oversized objects whose path names no shard (skip policy only)
    pub malformed: Vec<String>,
}

impl SplitReport {
    /// True when the index was modified
    pub fn changed(&self) -> bool {
        !self.split.is_empty()
    }
}

/// Walks a shard listing and subdivides every oversized shard once
pub struct Splitter<'a> {
    threshold_bytes: u64,
    shard_component: usize,
    malformed: MalformedPolicy,
    logger: &'a Logger,
}

impl<'a> Splitter<'a> {
    pub fn new(threshold_bytes: u64, logger: &'a Logger) -> Self {
        Self {
            threshold_bytes,
            shard_component: DEFAULT_SHARD_COMPONENT,
            malformed: MalformedPolicy::Fail,
            logger,
        }
    }

    pub fn with_shard_component(mut self, component: usize) -> Self {
        self.shard_component = component;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed = policy;
        self
    }

    /// Apply every listing entry to `index`, in listing order
    pub fn split(&self, index: &mut ShardIndex, listing: &[ListingEntry]) -> ShardingResult<SplitReport> {
        let mut report = SplitReport::default();

        for entry in listing {
            if entry.size_bytes <= self.threshold_bytes {
                continue;
            }
            report.oversized += 1;

            let shard = match self.shard_of(entry) {
                Ok(shard) => shard,
                Err(e) if self.malformed == MalformedPolicy::Skip => {
                    self.logger.warning(&format!("Skipping: {}", e));
                    report.malformed.push(entry.path.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.logger.step(&format!(
                "Shard {} too big ({} bytes).",
                shard, entry.size_bytes
            ));

            match self.subdivide(index, &shard, entry)? {
                Some(subdivision) => {
                    let placement = match subdivision {
                        Subdivision::Appended { .. } => "last line",
                        Subdivision::Inserted { .. } => "line",
                    };
                    self.logger.step(&format!(
                        "Found {} in {} {}. Breaking shard up...",
                        shard,
                        placement,
                        subdivision.line()
                    ));
                    report.split.push(shard);
                }
                None => {
                    self.logger.warning(&format!(
                        "No live entry for {} in the index; already subdivided or absent",
                        shard
                    ));
                    report.unmatched.push(shard);
                }
            }
        }

        Ok(report)
    }

    fn shard_of(&self, entry: &ListingEntry) -> ShardingResult<ShardId> {
        ShardId::from_object_path(&entry.path, self.shard_component)
    }

    fn subdivide(
        &self,
        index: &mut ShardIndex,
        shard: &ShardId,
        entry: &ListingEntry,
    ) -> ShardingResult<Option<Subdivision>> {
        let children = shard.children().ok_or_else(|| ShardingError::MalformedPath {
            path: entry.path.clone(),
            reason: format!("children of {} are out of range", shard),
        })?;
        Ok(index.subdivide(shard, children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn shard_path(id: &str) -> String {
        format!("PBF_Sharding/pbf/2024/01/02/world/{}.pbf", id)
    }

    fn listing(entries: &[(&str, u64)]) -> Vec<ListingEntry> {
        entries
            .iter()
            .map(|(id, size)| ListingEntry::new(shard_path(id), *size))
            .collect()
    }

    fn lines(index: &ShardIndex) -> Vec<String> {
        index.entries().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn small_shards_leave_the_index_alone() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n1-0-1\n");
        let before = index.clone();

        let report = Splitter::new(5 * MB, &logger)
            .split(&mut index, &listing(&[("1-0-0", 10), ("1-0-1", 5 * MB)]))
            .expect("split");

        assert!(!report.changed());
        assert_eq!(report.oversized, 0);
        assert_eq!(index, before);
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let logger = Logger::silent();
        let splitter = Splitter::new(5 * MB, &logger);

        let mut index = ShardIndex::parse("1-0-0\n");
        let report = splitter.split(&mut index, &listing(&[("1-0-0", 5 * MB)])).expect("split");
        assert!(!report.changed());

        let report = splitter.split(&mut index, &listing(&[("1-0-0", 5 * MB + 1)])).expect("split");
        assert!(report.changed());
    }

    #[test]
    fn single_split() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n");

        let report = Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("1-0-0", 2 * MB)]))
            .expect("split");

        assert!(report.changed());
        assert_eq!(report.split, [ShardId::new(1, 0, 0)]);
        assert_eq!(lines(&index), ["1-0-0+", "2-0-0", "2-0-1", "2-1-0", "2-1-1"]);
    }

    #[test]
    fn mid_index_split() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("0-0-0\n1-0-0\n1-0-1\n");

        Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("1-0-0", 2 * MB)]))
            .expect("split");

        assert_eq!(
            lines(&index),
            ["0-0-0", "1-0-0+", "2-0-0", "2-0-1", "2-1-0", "2-1-1", "1-0-1"]
        );
    }

    #[test]
    fn rerun_on_the_same_listing_changes_nothing() {
        let logger = Logger::silent();
        let splitter = Splitter::new(MB, &logger);
        let shards = listing(&[("1-0-1", 3 * MB), ("1-0-0", 2 * MB)]);
        let mut index = ShardIndex::parse("0-0-0+\n1-0-0\n1-0-1\n1-1-0\n1-1-1\n");

        assert_eq!(splitter.split(&mut index, &shards).expect("first").split.len(), 2);
        let after_first = index.clone();

        let report = splitter.split(&mut index, &shards).expect("second");
        assert!(!report.changed());
        assert_eq!(report.unmatched.len(), 2);
        assert_eq!(index, after_first);
    }

    #[test]
    fn each_split_adds_exactly_four_entries() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n1-0-1\n1-1-0\n1-1-1\n");

        let report = Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("1-1-0", 2 * MB), ("1-0-0", 2 * MB), ("1-1-1", 1)]))
            .expect("split");

        assert_eq!(report.split.len(), 2);
        assert_eq!(index.len(), 4 + 2 * 4);
    }

    #[test]
    fn listing_order_decides_the_result() {
        let logger = Logger::silent();
        let splitter = Splitter::new(MB, &logger);

        // parent first: its child exists by the time the child is listed
        let mut parent_first = ShardIndex::parse("1-0-0\n1-0-1\n");
        let report = splitter
            .split(&mut parent_first, &listing(&[("1-0-0", 2 * MB), ("2-0-1", 2 * MB)]))
            .expect("split");
        assert_eq!(report.split.len(), 2);
        assert_eq!(
            lines(&parent_first),
            ["1-0-0+", "2-0-0", "2-0-1+", "3-0-2", "3-0-3", "3-1-2", "3-1-3", "2-1-0", "2-1-1", "1-0-1"]
        );

        // child first: not in the index yet, left for a later run
        let mut child_first = ShardIndex::parse("1-0-0\n1-0-1\n");
        let report = splitter
            .split(&mut child_first, &listing(&[("2-0-1", 2 * MB), ("1-0-0", 2 * MB)]))
            .expect("split");
        assert_eq!(report.unmatched, [ShardId::new(2, 0, 1)]);
        assert_eq!(
            lines(&child_first),
            ["1-0-0+", "2-0-0", "2-0-1", "2-1-0", "2-1-1", "1-0-1"]
        );
    }

    #[test]
    fn last_line_children_are_appended() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n1-0-1\n");

        Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("1-0-1", 2 * MB), ("1-0-0", 2 * MB)]))
            .expect("split");

        assert_eq!(
            lines(&index),
            ["1-0-0+", "2-0-0", "2-0-1", "2-1-0", "2-1-1", "1-0-1+", "2-0-2", "2-0-3", "2-1-2", "2-1-3"]
        );
    }

    #[test]
    fn unknown_shards_are_not_errors() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n");

        let report = Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("7-7-7", 2 * MB)]))
            .expect("split");

        assert!(!report.changed());
        assert_eq!(report.unmatched, [ShardId::new(7, 7, 7)]);
    }

    #[test]
    fn substring_identifiers_are_not_confused() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("3-2-50\n3-2-51\n");

        let report = Splitter::new(MB, &logger)
            .split(&mut index, &listing(&[("3-2-5", 2 * MB)]))
            .expect("split");

        assert!(!report.changed());
        assert_eq!(lines(&index), ["3-2-50", "3-2-51"]);
    }

    #[test]
    fn malformed_path_fails_by_default() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n");
        let shallow = [ListingEntry::new("PBF_Sharding/1-0-0.pbf", 2 * MB)];

        let err = Splitter::new(MB, &logger).split(&mut index, &shallow).unwrap_err();
        assert!(matches!(err, ShardingError::MalformedPath { .. }));
    }

    #[test]
    fn malformed_path_can_be_skipped() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n");
        let mut shards = vec![ListingEntry::new("PBF_Sharding/a/b/c/d/e/sharding.txt", 2 * MB)];
        shards.extend(listing(&[("1-0-0", 2 * MB)]));

        let report = Splitter::new(MB, &logger)
            .with_malformed_policy(MalformedPolicy::Skip)
            .split(&mut index, &shards)
            .expect("split");

        assert_eq!(report.malformed, ["PBF_Sharding/a/b/c/d/e/sharding.txt"]);
        assert!(report.changed());
    }

    #[test]
    fn small_objects_with_odd_paths_are_ignored() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("1-0-0\n");
        let shards = [ListingEntry::new("PBF_Sharding/sharding.txt", 120)];

        let report = Splitter::new(MB, &logger).split(&mut index, &shards).expect("split");
        assert_eq!(report, SplitReport::default());
    }

    #[test]
    fn custom_shard_component() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse("0-0-0\n");
        let shards = [ListingEntry::new("tiles/0-0-0.pbf", 2 * MB)];

        let report = Splitter::new(MB, &logger)
            .with_shard_component(1)
            .split(&mut index, &shards)
            .expect("split");
        assert_eq!(report.split, [ShardId::new(0, 0, 0)]);
    }

    #[test]
    fn overflowing_children_are_malformed() {
        let logger = Logger::silent();
        let mut index = ShardIndex::parse(&format!("{}-0-0\n", u32::MAX));
        let shards = listing(&[(&format!("{}-0-0", u32::MAX), 2 * MB)]);

        assert!(matches!(
            Splitter::new(MB, &logger).split(&mut index, &shards),
            Err(ShardingError::MalformedPath { .. })
        ));
    }
}
