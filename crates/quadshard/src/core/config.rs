use serde::Deserialize;
use std::path::Path;

use crate::core::shard_id::DEFAULT_SHARD_COMPONENT;
use crate::utils::validate::{validate_object_name, validate_prefix};
use crate::utils::{ResultExt, ShardingError, ShardingResult};

pub const DEFAULT_SHARDING_FILE_NAME: &str = "sharding.txt";
pub const DEFAULT_MAX_MB: u64 = 5;
pub const DEFAULT_AWS_CLI: &str = "aws";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// What to do with a listed object whose path does not name a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Log the object and carry on with the listing
    Skip,
}

/// One layer of optional settings, either read from a TOML file or
/// collected from the command line
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Prefix holding the index file and the shard objects
    #[serde(default)]
    pub input: Option<String>,

    /// Index object name relative to `input`
    #[serde(default)]
    pub sharding_file_name: Option<String>,

    /// Size threshold in megabytes
    #[serde(default)]
    pub max: Option<u64>,

    /// Prefix the dated index is published under
    #[serde(default)]
    pub utils: Option<String>,

    /// Storage CLI executable
    #[serde(default)]
    pub aws_cli: Option<String>,

    /// Per-command timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub skip_malformed: Option<bool>,

    /// Path component that holds the shard file name
    #[serde(default)]
    pub shard_component: Option<usize>,
}

impl ConfigLayer {
    /// Load a layer from a TOML file; `~` is expanded
    pub fn from_file<P: AsRef<Path>>(path: P) -> ShardingResult<Self> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::tilde(&raw).into_owned();

        let content = std::fs::read_to_string(&expanded)
            .with_context(|| format!("Failed to read config file: {}", expanded))?;

        toml::from_str(&content)
            .map_err(|e| ShardingError::Config(format!("{}: {}", expanded, e)))
    }

    /// Values set in `over` win
    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            input: over.input.or(self.input),
            sharding_file_name: over.sharding_file_name.or(self.sharding_file_name),
            max: over.max.or(self.max),
            utils: over.utils.or(self.utils),
            aws_cli: over.aws_cli.or(self.aws_cli),
            timeout: over.timeout.or(self.timeout),
            skip_malformed: over.skip_malformed.or(self.skip_malformed),
            shard_component: over.shard_component.or(self.shard_component),
        }
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardingConfig {
    pub input: String,
    pub sharding_file_name: String,
    pub max_mb: u64,
    pub utils: String,
    pub aws_cli: String,
    pub timeout: Option<u64>,
    pub malformed: MalformedPolicy,
    pub shard_component: usize,
}

impl ShardingConfig {
    /// Apply defaults to a merged layer and validate the result
    pub fn resolve(layer: ConfigLayer) -> ShardingResult<Self> {
        let input = layer
            .input
            .ok_or_else(|| ShardingError::Config("an input prefix is required (--input)".to_string()))?;
        validate_prefix(&input)?;

        let sharding_file_name = layer
            .sharding_file_name
            .unwrap_or_else(|| DEFAULT_SHARDING_FILE_NAME.to_string());
        validate_object_name(&sharding_file_name)?;

        let max_mb = layer.max.unwrap_or(DEFAULT_MAX_MB);
        if max_mb == 0 || max_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ShardingError::Config(format!("max size out of range: {} MB", max_mb)));
        }

        // Publish next to the input when no utils prefix is configured
        let utils = layer.utils.unwrap_or_else(|| input.clone());
        validate_prefix(&utils)?;

        Ok(Self {
            input,
            sharding_file_name,
            max_mb,
            utils,
            aws_cli: layer.aws_cli.unwrap_or_else(|| DEFAULT_AWS_CLI.to_string()),
            timeout: layer.timeout,
            malformed: if layer.skip_malformed.unwrap_or(false) {
                MalformedPolicy::Skip
            } else {
                MalformedPolicy::Fail
            },
            shard_component: layer.shard_component.unwrap_or(DEFAULT_SHARD_COMPONENT),
        })
    }

    /// Full path of the current index object
    pub fn index_path(&self) -> String {
        format!("{}{}", self.input, self.sharding_file_name)
    }

    /// Shards strictly larger than this are split
    pub fn threshold_bytes(&self) -> u64 {
        self.max_mb * BYTES_PER_MB
    }
}
