//! Object storage seam: fetching the index, listing shards, publishing.

pub mod client;
pub mod core;
pub mod memory;

pub use client::AwsCliStore;
pub use memory::{MemoryStore, StoreOperation};

use tracing::trace;

use crate::utils::ShardingResult;

/// The three storage operations index maintenance needs
pub trait ObjectStore {
    /// Read a whole object. Fails with `ShardingError::Fetch`.
    fn fetch_object(&self, path: &str) -> ShardingResult<Vec<u8>>;

    /// Every object under `prefix`, in the store's listing order. Fails with
    /// `ShardingError::Listing`.
    fn list_objects_recursive(&self, prefix: &str) -> ShardingResult<Vec<ListingEntry>>;

    /// Write a whole object. Fails with `ShardingError::Publish`.
    fn put_object(&self, path: &str, bytes: &[u8]) -> ShardingResult<()>;
}

/// One listed object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Object key relative to the bucket
    pub path: String,
    pub size_bytes: u64,
}

impl ListingEntry {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }

    /// Parse one line of recursive listing output:
    /// `2024-01-02 10:11:12     48213 PBF_Sharding/.../3-2-5.pbf`.
    ///
    /// The third whitespace-separated field is the size and everything after
    /// it is the key. Headers, blank lines and lines whose size field is not
    /// a number yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut rest = line.trim();
        let mut fields = [""; 3];
        for field in fields.iter_mut() {
            if rest.is_empty() {
                return None;
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            *field = &rest[..end];
            rest = rest[end..].trim_start();
        }

        let size_bytes = fields[2].parse().ok()?;
        Some(Self::new(rest, size_bytes))
    }
}

/// Parse full listing output, dropping non-data lines
pub fn parse_listing(text: &str) -> Vec<ListingEntry> {
    text.lines()
        .filter_map(|line| {
            let entry = ListingEntry::parse_line(line);
            if entry.is_none() && !line.trim().is_empty() {
                trace!("Skipping listing line: {}", line);
            }
            entry
        })
        .collect()
}

/// Strip `s3://<bucket>/` from a location, leaving the object key.
/// Locations without a scheme are returned unchanged.
pub fn object_key(location: &str) -> &str {
    match location.strip_prefix("s3://") {
        Some(rest) => rest.find('/').map_or("", |slash| &rest[slash + 1..]),
        None => location,
    }
}
