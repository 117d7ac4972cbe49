//! Package cache: staging area for fetched dependency content.
//!
//! Cache location: `$CTIPKG_CACHE_DIR`, otherwise the OS cache directory
//! (`~/.cache/ctipkg/packages` on Linux). See [`crate::config::Settings`].
//!
//! Layout:
//! ```text
//! <cache>/
//! ├── <escaped-name>@<version>/
//! │   ├── index.json
//! │   └── ...
//! └── ...
//! ```
//!
//! Entries are written once per `(name, version)` and reused by later
//! installs; removing the directory is always safe.

use std::path::{Path, PathBuf};

use crate::package::error::{PackageError, Result};

// ─── Cache Directory ───────────────────────────────────────────────

/// `<OS cache dir>/ctipkg/packages`, used when `$CTIPKG_CACHE_DIR` is unset.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|base| base.join("ctipkg").join("packages"))
}

/// Make a source name usable as a single path component.
///
/// Percent-encoding keeps the mapping reversible, so distinct names never
/// share a directory.
pub fn escape_name(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Directory holding one cached package version.
pub fn entry_path(cache_dir: &Path, name: &str, version: &str) -> PathBuf {
    cache_dir.join(format!("{}@{}", escape_name(name), escape_name(version)))
}

// ─── Cache Statistics ──────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached package versions.
    pub entries: usize,
    /// Total size in bytes.
    pub total_bytes: u64,
}

/// Count entries and bytes under `cache_dir`.
pub fn stats(cache_dir: &Path) -> CacheStats {
    let mut stats = CacheStats::default();
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return stats;
    };
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        stats.entries += 1;
        stats.total_bytes += walkdir::WalkDir::new(entry.path())
            .into_iter()
            .flatten()
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum::<u64>();
    }
    stats
}

/// Remove the whole cache.
pub fn clear(cache_dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PackageError::Write {
            path: cache_dir.to_path_buf(),
            source,
        }),
    }
}
