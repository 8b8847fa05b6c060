//! Local file output for `--keep-local`.

use std::fs;
use std::io;
use std::path::Path;

use crate::utils::{ShardingError, ShardingResult};

fn at(path: &Path) -> impl FnOnce(io::Error) -> ShardingError + '_ {
    move |source| ShardingError::Filesystem {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `path` and any missing parents; an existing non-directory is an error
pub fn ensure_dir_exists(path: &Path) -> ShardingResult<()> {
    if path.exists() && !path.is_dir() {
        return Err(at(path)(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "exists and is not a directory",
        )));
    }
    fs::create_dir_all(path).map_err(at(path))
}

/// Create the directory a file will be written into
pub fn ensure_parent_dir_exists(file_path: &Path) -> ShardingResult<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir_exists(parent),
        _ => Ok(()),
    }
}

/// Write `contents` to `path`, creating its parent directory first
pub fn write_file(path: &Path, contents: &[u8]) -> ShardingResult<()> {
    ensure_parent_dir_exists(path)?;
    fs::write(path, contents).map_err(at(path))
}
