//! Package manager: the install, pack and validate workflows over one
//! package directory.
//!
//! The manager owns the package (manifest + lock) and delegates to three
//! collaborators: a [`Resolver`] that fetches dependencies, a
//! [`SchemaParser`] that builds entity registries and their metadata
//! caches, and [`TreeOps`] for whole-tree filesystem replacement.
//!
//! Layout of a managed package:
//! ```text
//! <base>/
//! ├── index.json
//! ├── index-lock.json
//! ├── .cache.json          derived metadata cache
//! ├── bundle.zip           produced by `pack`
//! └── .dep/
//!     └── <installed id>/  one per locked dependency
//!         ├── index.json
//!         ├── .cache.json
//!         └── .dep/<id>    links to sibling dependencies
//! ```

use std::path::{Path, PathBuf};

use crate::package::error::Result;
use crate::package::fsutil::{LocalFs, TreeOps};
use crate::package::manifest::Package;
use crate::package::resolve::Resolver;
use crate::schema::{JsonSchemaParser, SchemaParser};

mod install;
mod pack;
mod validate;

pub use install::merge_depends;


pub const DEPENDENCY_DIR_NAME: &str = ".dep";
pub const BUNDLE_NAME: &str = "bundle.zip";

pub struct PackageManager {
    pub package: Package,
    pub package_cache_dir: PathBuf,
    pub dependencies_dir: PathBuf,
    pub base_dir: PathBuf,

    resolver: Box<dyn Resolver>,
    parser: Box<dyn SchemaParser>,
    fs: Box<dyn TreeOps>,
}

impl PackageManager {
    /// Manage `package`, staging fetched content under `package_cache_dir`.
    ///
    /// The base directory is made absolute so dependency links stay valid
    /// regardless of the working directory.
    pub fn new(package: Package, package_cache_dir: PathBuf, resolver: Box<dyn Resolver>) -> Self {
        let base_dir =
            std::path::absolute(&package.base_dir).unwrap_or_else(|_| package.base_dir.clone());
        PackageManager {
            dependencies_dir: base_dir.join(DEPENDENCY_DIR_NAME),
            base_dir,
            package,
            package_cache_dir,
            resolver,
            parser: Box::new(JsonSchemaParser),
            fs: Box::new(LocalFs),
        }
    }

    /// Open the package whose manifest is at `index_path`.
    pub fn open(
        index_path: &Path,
        package_cache_dir: PathBuf,
        resolver: Box<dyn Resolver>,
    ) -> Result<Self> {
        let package = Package::open(index_path)?;
        Ok(Self::new(package, package_cache_dir, resolver))
    }

    pub fn with_parser(mut self, parser: Box<dyn SchemaParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_fs(mut self, fs: Box<dyn TreeOps>) -> Self {
        self.fs = fs;
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join(crate::package::manifest::INDEX_FILE_NAME)
    }
}
