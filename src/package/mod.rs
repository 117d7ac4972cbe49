pub mod cache;
pub mod error;
pub mod fsutil;
pub mod hash;
pub mod manager;
pub mod manifest;
pub mod resolve;

use std::path::Path;

use error::{PackageError, Result};

/// Read a whole file, attaching its path to any error.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| PackageError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write through a sibling temp file and rename, so readers never see a
/// torn manifest or lock.
pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, bytes).map_err(|source| PackageError::Write {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| PackageError::Write {
        path: path.to_path_buf(),
        source,
    })
}
