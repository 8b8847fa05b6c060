//! Input validation for storage locations and names.
//!
//! Prefixes and object names end up as arguments to the storage CLI, so they
//! are restricted to safe patterns before any command is built from them.

use crate::utils::{ShardingError, ShardingResult};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // s3://bucket/optional/key/prefix/
    static ref S3_PREFIX_REGEX: Regex =
        Regex::new(r"^s3://[a-z0-9][a-z0-9.\-]{1,61}[a-z0-9](/[^\s]*)?/$").unwrap();

    // Relative object name, no leading slash, no parent traversal
    static ref OBJECT_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_\-.]+(/[A-Za-z0-9_\-.]+)*$").unwrap();
}

/// Validate a storage prefix. Prefixes are concatenated with object names,
/// so they must end in `/`.
pub fn validate_prefix(prefix: &str) -> ShardingResult<&str> {
    if prefix.is_empty() {
        return Err(ShardingError::Validation("Prefix cannot be empty".to_string()));
    }

    if prefix.starts_with("s3://") {
        if !S3_PREFIX_REGEX.is_match(prefix) {
            return Err(ShardingError::Validation(format!(
                "Invalid S3 prefix: '{}'. Expected s3://<bucket>/<key prefix>/",
                prefix
            )));
        }
    } else if !prefix.ends_with('/') {
        return Err(ShardingError::Validation(format!(
            "Invalid prefix: '{}'. Prefixes must end with '/'",
            prefix
        )));
    }

    Ok(prefix)
}

/// Validate the index object name relative to the input prefix
pub fn validate_object_name(name: &str) -> ShardingResult<&str> {
    if !OBJECT_NAME_REGEX.is_match(name) || name.split('/').any(|part| part == "..") {
        return Err(ShardingError::Validation(format!(
            "Invalid object name: '{}'",
            name
        )));
    }
    Ok(name)
}
