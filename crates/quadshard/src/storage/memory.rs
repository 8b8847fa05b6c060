use std::cell::{Cell, RefCell};

use super::{object_key, ListingEntry, ObjectStore};
use crate::utils::{ShardingError, ShardingResult};

#[derive(Debug, Clone)]
struct MemoryObject {
    location: String,
    bytes: Vec<u8>,
    size_bytes: u64,
}

/// Storage operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Fetch,
    List,
    Put,
}

/// In-process object store.
///
/// Objects keep their insertion order, which is also the listing order.
/// Locations use the same `s3://bucket/key` form as the CLI store and are
/// listed by key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RefCell<Vec<MemoryObject>>,
    failing: RefCell<Vec<StoreOperation>>,
    puts: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object with real contents
    pub fn with_object(self, location: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let size_bytes = bytes.len() as u64;
        self.store(location, bytes, size_bytes);
        self
    }

    /// Store a placeholder that only reports a size
    pub fn with_sized(self, location: &str, size_bytes: u64) -> Self {
        self.store(location, Vec::new(), size_bytes);
        self
    }

    /// Make every call of `operation` fail
    pub fn failing(self, operation: StoreOperation) -> Self {
        self.failing.borrow_mut().push(operation);
        self
    }

    /// Contents of an object, if present
    pub fn get(&self, location: &str) -> Option<Vec<u8>> {
        self.objects
            .borrow()
            .iter()
            .find(|object| object.location == location)
            .map(|object| object.bytes.clone())
    }

    /// Number of successful `put_object` calls
    pub fn put_count(&self) -> usize {
        self.puts.get()
    }

    fn store(&self, location: &str, bytes: Vec<u8>, size_bytes: u64) {
        let mut objects = self.objects.borrow_mut();
        let object = MemoryObject {
            location: location.to_string(),
            bytes,
            size_bytes,
        };
        match objects.iter_mut().find(|existing| existing.location == location) {
            Some(existing) => *existing = object,
            None => objects.push(object),
        }
    }

    fn fails(&self, operation: StoreOperation) -> bool {
        self.failing.borrow().contains(&operation)
    }
}

impl ObjectStore for MemoryStore {
    fn fetch_object(&self, path: &str) -> ShardingResult<Vec<u8>> {
        let missing = |reason: &str| ShardingError::Fetch {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if self.fails(StoreOperation::Fetch) {
            return Err(missing("injected failure"));
        }
        self.get(path).ok_or_else(|| missing("no such object"))
    }

    fn list_objects_recursive(&self, prefix: &str) -> ShardingResult<Vec<ListingEntry>> {
        if self.fails(StoreOperation::List) {
            return Err(ShardingError::Listing {
                prefix: prefix.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        Ok(self
            .objects
            .borrow()
            .iter()
            .filter(|object| object.location.starts_with(prefix))
            .map(|object| ListingEntry::new(object_key(&object.location), object.size_bytes))
            .collect())
    }

    fn put_object(&self, path: &str, bytes: &[u8]) -> ShardingResult<()> {
        if self.fails(StoreOperation::Put) {
            return Err(ShardingError::Publish {
                path: path.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        self.store(path, bytes.to_vec(), bytes.len() as u64);
        self.puts.set(self.puts.get() + 1);
        Ok(())
    }
}
