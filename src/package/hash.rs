//! Content digest of a package directory.
//!
//! The digest covers every regular file's relative path and bytes, in
//! sorted path order with `/` separators, so the same tree hashes the same
//! on every platform. Nested `.dep` and `.git` directories are skipped:
//! they are install state, not package content.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::package::error::{PackageError, Result};

const HASH_VERSION: u8 = 1;
const SKIPPED_DIRS: [&str; 2] = [".dep", ".git"];

/// BLAKE3 digest of a directory tree, as `blake3:<hex>`.
pub fn tree_digest(root: &Path) -> Result<String> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| {
        e.depth() == 0
            || !(e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
    }) {
        let entry = entry.map_err(|e| PackageError::Read {
            path: root.to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((rel, entry.path().to_path_buf()));
    }
    files.sort();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&[HASH_VERSION]);
    for (rel, path) in files {
        let bytes = crate::package::read_file(&path)?;
        hasher.update(b"F\0");
        hasher.update(rel.as_bytes());
        hasher.update(b"\0");
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_digest_is_stable_and_detects_change() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), "hello").unwrap();
        std::fs::write(root.join("sub/b.txt"), "world").unwrap();

        let d1 = tree_digest(root).unwrap();
        let d2 = tree_digest(root).unwrap();
        assert_eq!(d1, d2);
        assert!(d1.starts_with("blake3:"));

        std::fs::write(root.join("sub/b.txt"), "WORLD").unwrap();
        assert_ne!(tree_digest(root).unwrap(), d1);
    }

    #[test]
    fn test_tree_digest_ignores_install_state() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("index.json"), "{}").unwrap();
        let before = tree_digest(root).unwrap();

        std::fs::create_dir_all(root.join(".dep/other")).unwrap();
        std::fs::write(root.join(".dep/other/index.json"), "{}").unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/config"), "x").unwrap();

        assert_eq!(tree_digest(root).unwrap(), before);
    }

    #[test]
    fn test_tree_digest_depends_on_paths() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("x.txt"), "same").unwrap();
        std::fs::write(b.path().join("y.txt"), "same").unwrap();
        assert_ne!(tree_digest(a.path()).unwrap(), tree_digest(b.path()).unwrap());
    }
}
