//! The persisted sharding index: an ordered list of quadtree leaves.
//!
//! Each line is either a live shard (`3-2-5`) or a tombstone for a shard that
//! has already been split (`3-2-5+`). Lines that are neither are kept
//! verbatim so that a rewrite never loses content.

use std::fmt;

use crate::core::shard_id::ShardId;

/// Suffix marking a subdivided shard
pub const SUBDIVIDED_MARKER: char = '+';

/// One line of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    /// A data-bearing leaf
    Active(ShardId),
    /// A shard that has been split; never matched again
    Subdivided(ShardId),
    /// Anything that is not an identifier, preserved as-is
    Opaque(String),
}

impl IndexEntry {
    /// Parse a single line, without its line terminator.
    ///
    /// Surrounding whitespace is ignored when classifying; identifiers are
    /// written back bare, opaque lines exactly as read.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches('\r');
        let trimmed = line.trim();
        if let Some(stem) = trimmed.strip_suffix(SUBDIVIDED_MARKER) {
            if let Ok(id) = stem.parse() {
                return IndexEntry::Subdivided(id);
            }
        } else if let Ok(id) = trimmed.parse() {
            return IndexEntry::Active(id);
        }
        IndexEntry::Opaque(line.to_string())
    }

    /// True when this line is the live leaf for `id`
    pub fn is_active(&self, id: &ShardId) -> bool {
        matches!(self, IndexEntry::Active(active) if active == id)
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexEntry::Active(id) => write!(f, "{}", id),
            IndexEntry::Subdivided(id) => write!(f, "{}{}", id, SUBDIVIDED_MARKER),
            IndexEntry::Opaque(raw) => f.write_str(raw),
        }
    }
}

/// Where a subdivision landed in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdivision {
    /// The shard was the final line; its children were appended
    Appended { line: usize },
    /// The shard was found by scanning; its children follow it
    Inserted { line: usize },
}

impl Subdivision {
    pub fn line(&self) -> usize {
        match *self {
            Subdivision::Appended { line } | Subdivision::Inserted { line } => line,
        }
    }
}

/// In-memory sharding index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardIndex {
    entries: Vec<IndexEntry>,
}

impl ShardIndex {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Parse index text, one entry per line
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.lines().map(IndexEntry::parse).collect(),
        }
    }

    /// Render the index, one entry per line, newline terminated
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tombstone the live entry for `id` and place `children` after it.
    ///
    /// The final line is checked first; when it is the live entry the
    /// children are appended. Otherwise the first live entry from the top
    /// is used and the children are inserted right behind it. Returns
    /// `None`, leaving the index untouched, when `id` has no live entry.
    pub fn subdivide(&mut self, id: &ShardId, children: [ShardId; 4]) -> Option<Subdivision> {
        let last = self.entries.len().checked_sub(1)?;

        if self.entries[last].is_active(id) {
            self.entries[last] = IndexEntry::Subdivided(*id);
            self.entries.extend(children.map(IndexEntry::Active));
            return Some(Subdivision::Appended { line: last });
        }

        let line = self.entries.iter().position(|entry| entry.is_active(id))?;
        self.entries[line] = IndexEntry::Subdivided(*id);
        for (offset, child) in children.into_iter().enumerate() {
            self.entries.insert(line + 1 + offset, IndexEntry::Active(child));
        }
        Some(Subdivision::Inserted { line })
    }
}
