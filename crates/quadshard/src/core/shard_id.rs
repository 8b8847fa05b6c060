use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::utils::{ShardingError, ShardingResult};

lazy_static! {
    // Canonical rendering only: no signs, no leading zeros
    static ref SHARD_ID_REGEX: Regex =
        Regex::new(r"^(0|[1-9][0-9]*)-(0|[1-9][0-9]*)-(0|[1-9][0-9]*)$").unwrap();
}

/// Path component that carries the shard file name in the storage layout
pub const DEFAULT_SHARD_COMPONENT: usize = 6;

/// Returned when a string is not a canonical `zoom-x-y` identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a zoom-x-y shard identifier")]
pub struct InvalidShardId(pub String);

/// A quadtree tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
}

impl ShardId {
    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// The four quadrants one zoom level down, in index insertion order.
    ///
    /// Returns `None` when the next level cannot be represented.
    pub fn children(&self) -> Option<[ShardId; 4]> {
        let zoom = self.zoom.checked_add(1)?;
        let x0 = self.x.checked_mul(2)?;
        let y0 = self.y.checked_mul(2)?;
        let x1 = x0.checked_add(1)?;
        let y1 = y0.checked_add(1)?;

        Some([
            ShardId::new(zoom, x0, y0),
            ShardId::new(zoom, x0, y1),
            ShardId::new(zoom, x1, y0),
            ShardId::new(zoom, x1, y1),
        ])
    }

    /// Derive the identifier from an object path such as
    /// `PBF_Sharding/a/b/c/d/e/3-2-5.pbf`: take the slash-delimited component
    /// at `component` and drop everything from its first `.` onward.
    pub fn from_object_path(path: &str, component: usize) -> ShardingResult<Self> {
        let segment = path.split('/').nth(component).ok_or_else(|| ShardingError::MalformedPath {
            path: path.to_string(),
            reason: format!("expected at least {} path components", component + 1),
        })?;

        let stem = segment.split('.').next().unwrap_or(segment);
        stem.parse().map_err(|e: InvalidShardId| ShardingError::MalformedPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl FromStr for ShardId {
    type Err = InvalidShardId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidShardId(s.to_string());
        let caps = SHARD_ID_REGEX.captures(s).ok_or_else(invalid)?;
        let field = |i: usize| caps[i].parse::<u32>().map_err(|_| invalid());

        Ok(ShardId::new(field(1)?, field(2)?, field(3)?))
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_identifiers() {
        assert_eq!("3-2-5".parse::<ShardId>(), Ok(ShardId::new(3, 2, 5)));
        assert_eq!("0-0-0".parse::<ShardId>(), Ok(ShardId::new(0, 0, 0)));
        assert_eq!(ShardId::new(12, 1024, 77).to_string(), "12-1024-77");
    }

    #[test]
    fn rejects_non_canonical_identifiers() {
        for bad in ["", "3-2", "3-2-5-1", "3-2-5+", "+3-2-5", "03-2-5", "a-b-c", "3 -2-5", "3-2-99999999999"] {
            assert!(bad.parse::<ShardId>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn children_cover_the_four_quadrants_in_order() {
        let children = ShardId::new(1, 0, 0).children().expect("children");
        let rendered: Vec<String> = children.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["2-0-0", "2-0-1", "2-1-0", "2-1-1"]);

        let children = ShardId::new(3, 2, 5).children().expect("children");
        let rendered: Vec<String> = children.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["4-4-10", "4-4-11", "4-5-10", "4-5-11"]);
    }

    #[test]
    fn children_overflow_is_reported() {
        assert!(ShardId::new(u32::MAX, 0, 0).children().is_none());
        assert!(ShardId::new(31, u32::MAX / 2 + 1, 0).children().is_none());
    }

    #[test]
    fn identifier_from_object_path() {
        let id = ShardId::from_object_path("PBF_Sharding/pbf/2024/01/02/world/3-2-5.pbf", 6).expect("id");
        assert_eq!(id, ShardId::new(3, 2, 5));

        // everything after the first dot is dropped
        let id = ShardId::from_object_path("a/b/c/d/e/f/7-1-1.osm.pbf", 6).expect("id");
        assert_eq!(id, ShardId::new(7, 1, 1));

        let id = ShardId::from_object_path("a/1-1-0", 1).expect("id");
        assert_eq!(id, ShardId::new(1, 1, 0));
    }

    #[test]
    fn malformed_object_paths() {
        assert!(matches!(
            ShardId::from_object_path("a/b/c/3-2-5.pbf", 6),
            Err(ShardingError::MalformedPath { .. })
        ));
        assert!(matches!(
            ShardId::from_object_path("a/b/c/d/e/f/sharding.txt", 6),
            Err(ShardingError::MalformedPath { .. })
        ));
    }
}
