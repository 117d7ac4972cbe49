//! Directory replacement primitives.
//!
//! Installed dependency trees are placed at canonical paths by making the
//! destination an exact copy ([`replace_with_copy`]) or an exact move
//! ([`replace_with_move`]) of a source tree. Dependency links inside an
//! installed package are rewritten with [`link_dir`].
//!
//! `replace_with_move` is a rename: atomic on one filesystem, not across
//! mount points (the rename fails there with `CrossesDevices`/`EXDEV`).
//!
//! The package manager goes through [`TreeOps`] so tests can substitute
//! their own implementation.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::package::error::{PackageError, Result};

#[cfg(test)]
mod tests;

/// Tree-level filesystem capability used by the installer and resolvers.
pub trait TreeOps {
    fn replace_with_copy(&self, src: &Path, dst: &Path) -> Result<()>;
    fn replace_with_move(&self, src: &Path, dst: &Path) -> Result<()>;
    fn link_dir(&self, target: &Path, link: &Path) -> Result<()>;
}

/// The local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl TreeOps for LocalFs {
    fn replace_with_copy(&self, src: &Path, dst: &Path) -> Result<()> {
        replace_with_copy(src, dst)
    }

    fn replace_with_move(&self, src: &Path, dst: &Path) -> Result<()> {
        replace_with_move(src, dst)
    }

    fn link_dir(&self, target: &Path, link: &Path) -> Result<()> {
        link_dir(target, link)
    }
}

fn fs_err(action: &'static str, src: &Path, dst: &Path) -> impl FnOnce(std::io::Error) -> PackageError {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    move |source| PackageError::Fs {
        action,
        src,
        dst,
        source,
    }
}

// ─── Replace ───────────────────────────────────────────────────────

/// Make `dst` an independent deep copy of `src`, discarding whatever `dst`
/// held before. `src` is left untouched.
pub fn replace_with_copy(src: &Path, dst: &Path) -> Result<()> {
    match std::fs::symlink_metadata(dst) {
        Ok(_) => remove_path(dst).map_err(fs_err("remove existing", src, dst))?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(fs_err("stat", src, dst)(e)),
    }

    std::fs::create_dir_all(dst).map_err(fs_err("create directory", src, dst))?;
    copy_tree(src, dst)?;
    debug!(src = %src.display(), dst = %dst.display(), "replaced with copy");
    Ok(())
}

/// Move `src` to `dst`, discarding whatever `dst` held before.
pub fn replace_with_move(src: &Path, dst: &Path) -> Result<()> {
    match remove_path(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(fs_err("remove existing", src, dst)(e)),
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(fs_err("create parent of", src, dst))?;
    }
    std::fs::rename(src, dst).map_err(fs_err("move", src, dst))?;
    debug!(src = %src.display(), dst = %dst.display(), "replaced with move");
    Ok(())
}

/// Replace whatever is at `link` with a link to the directory `target`.
///
/// Unix gets a symlink; elsewhere the target tree is copied.
pub fn link_dir(target: &Path, link: &Path) -> Result<()> {
    let link_err = |source| PackageError::Link {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    };
    match remove_path(link) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(link_err(e)),
    }
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent).map_err(link_err)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(link_err)?;
    }
    #[cfg(not(unix))]
    {
        replace_with_copy(target, link)?;
    }
    Ok(())
}

// ─── Helpers ───────────────────────────────────────────────────────

/// Remove a file, symlink or directory tree. Symlinks are never followed.
fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(ErrorKind::Other, "filesystem loop"));
            fs_err("walk", src, dst)(source)
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let out = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&out).map_err(fs_err("create directory", entry.path(), &out))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &out)?;
        } else {
            std::fs::copy(entry.path(), &out).map_err(fs_err("copy", entry.path(), &out))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = std::fs::read_link(src).map_err(fs_err("read link", src, dst))?;
    std::os::unix::fs::symlink(&target, dst).map_err(fs_err("copy link", src, dst))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        std::fs::create_dir_all(dst).map_err(fs_err("create directory", src, dst))?;
        copy_tree(src, dst)
    } else {
        std::fs::copy(src, dst)
            .map(|_| ())
            .map_err(fs_err("copy", src, dst))
    }
}
