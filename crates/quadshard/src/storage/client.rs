use std::fs;

use tempfile::TempDir;

use super::core::AwsCore;
use super::{parse_listing, ListingEntry, ObjectStore};
use crate::core::ShardingConfig;
use crate::utils::{ResultExt, ShardingError, ShardingResult};

const SCRATCH_NAME: &str = "sharding.txt";

/// Object store backed by the `aws s3` command line.
///
/// Objects pass through a scratch file in a private temporary directory,
/// removed when the store is dropped.
pub struct AwsCliStore {
    core: AwsCore,
    scratch: TempDir,
}

impl AwsCliStore {
    pub fn new(core: AwsCore) -> ShardingResult<Self> {
        let scratch = TempDir::new().with_context(|| "Failed to create scratch directory")?;
        Ok(Self { core, scratch })
    }

    /// Build a store from resolved settings
    pub fn from_config(config: &ShardingConfig) -> ShardingResult<Self> {
        let mut core = AwsCore::with_path(config.aws_cli.clone());
        if let Some(seconds) = config.timeout {
            core = core.with_timeout(seconds);
        }
        Self::new(core)
    }

    fn scratch_path(&self) -> String {
        self.scratch.path().join(SCRATCH_NAME).to_string_lossy().into_owned()
    }
}

impl ObjectStore for AwsCliStore {
    fn fetch_object(&self, path: &str) -> ShardingResult<Vec<u8>> {
        let local = self.scratch_path();
        self.core
            .execute(&["s3", "cp", path, &local])
            .map_err(|e| ShardingError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        fs::read(&local).map_err(|e| ShardingError::Fetch {
            path: path.to_string(),
            reason: format!("scratch copy unreadable: {}", e),
        })
    }

    fn list_objects_recursive(&self, prefix: &str) -> ShardingResult<Vec<ListingEntry>> {
        let output = self
            .core
            .execute(&["s3", "ls", "--recursive", prefix])
            .map_err(|e| ShardingError::Listing {
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    fn put_object(&self, path: &str, bytes: &[u8]) -> ShardingResult<()> {
        let local = self.scratch_path();
        fs::write(&local, bytes).map_err(|e| ShardingError::Publish {
            path: path.to_string(),
            reason: format!("scratch copy unwritable: {}", e),
        })?;

        self.core
            .execute(&["s3", "cp", &local, path])
            .map_err(|e| ShardingError::Publish {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
