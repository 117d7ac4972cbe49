//! Dependency fetching.
//!
//! The installer hands a list of specs to a [`Resolver`], which places each
//! resolved package (and its transitive dependencies) at
//! `<base>/.dep/<installed identifier>/` and reports what it installed and
//! which previously locked dependencies it superseded. How bytes are
//! obtained is the resolver's business.

use std::collections::BTreeSet;
use std::path::Path;

use crate::package::error::Result;
use crate::package::fsutil::TreeOps;
use crate::package::manifest::{IndexLock, PackageLock, SourceInfo};

mod directory;

pub use directory::{select_version, DirectoryResolver, STAGING_DIR_NAME};

#[cfg(test)]
mod tests;

// ─── Data Types ────────────────────────────────────────────────────

/// What a resolver may read and use while installing.
pub struct InstallContext<'a> {
    /// `<base>/.dep`
    pub dependencies_dir: &'a Path,
    /// Process-wide staging cache.
    pub package_cache_dir: &'a Path,
    /// The lock as it was before this install.
    pub lock: &'a IndexLock,
    pub fs: &'a dyn TreeOps,
}

/// One dependency placed under `.dep/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledPackage {
    pub source_name: String,
    pub lock: PackageLock,
    pub info: SourceInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Everything installed, direct and transitive, in resolution order.
    pub installed: Vec<InstalledPackage>,
    /// Source names whose previously locked version was superseded.
    pub replaced: BTreeSet<String>,
}

impl Resolution {
    pub fn installed_names(&self) -> Vec<String> {
        self.installed.iter().map(|p| p.source_name.clone()).collect()
    }
}

// ─── Resolver Collaborator ─────────────────────────────────────────

pub trait Resolver {
    /// Fetch and place `depends`. With `replace`, a requested dependency that
    /// is already locked is re-resolved instead of kept.
    fn download(
        &mut self,
        ctx: &InstallContext<'_>,
        depends: &[String],
        replace: bool,
    ) -> Result<Resolution>;
}
