//! Package manifest (`index.json`) and lock snapshot (`index-lock.json`).
//!
//! The manifest is author-facing: identity, schema dialect, entity and
//! dictionary files, and an ordered list of dependency specs
//! (`name` or `name@version`). The lock is tool-generated and rewritten in
//! full after every successful install.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::package::error::{PackageError, Result};
use crate::package::{read_file, write_file_atomic};

mod depend;
mod dictionary;
mod lockfile;

pub use depend::{dependency_name, parse_dependency, DependencySpec};
pub use dictionary::{Dictionaries, Entry, LangCode};
pub use lockfile::{
    IndexLock, LockTable, PackageLock, SourceInfo, INDEX_LOCK_FILE_NAME, INDEX_LOCK_VERSION,
};


pub const INDEX_FILE_NAME: &str = "index.json";

// ─── Manifest ──────────────────────────────────────────────────────

/// Package manifest as stored in `index.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub app_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ramlx_version: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dictionaries: Vec<String>,
    #[serde(default)]
    pub depends: Vec<String>,
    /// Serialized metadata caches shipped alongside the manifest (bundles only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serialized: Vec<String>,

    #[serde(skip)]
    pub file_path: PathBuf,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Index {
    /// Read a manifest file.
    pub fn read(path: &Path) -> Result<Index> {
        let content = read_file(path)?;
        let mut idx: Index =
            serde_json::from_slice(&content).map_err(|source| PackageError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        idx.file_path = path.to_path_buf();
        idx.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Ok(idx)
    }

    /// Write the manifest to `<base_dir>/index.json`.
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(INDEX_FILE_NAME);
        let bytes = self.to_bytes().map_err(|source| PackageError::Json {
            path: path.clone(),
            source,
        })?;
        write_file_atomic(&path, &bytes)
    }

    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// List a serialized cache file, once.
    pub fn put_serialized(&mut self, path: &str) {
        if !self.serialized.iter().any(|p| p == path) {
            self.serialized.push(path.to_string());
        }
    }

    /// Parsed names of the declared dependencies, in manifest order.
    pub fn depend_names(&self) -> Vec<&str> {
        self.depends.iter().map(|d| dependency_name(d)).collect()
    }
}

// ─── Package ───────────────────────────────────────────────────────

/// A package directory: its manifest and lock snapshot.
#[derive(Clone, Debug)]
pub struct Package {
    pub index: Index,
    pub index_lock: IndexLock,
    pub base_dir: PathBuf,
}

impl Package {
    /// A fresh package rooted at `base_dir`. Nothing is written until saved.
    pub fn new(base_dir: &Path) -> Self {
        Package {
            index: Index {
                file_path: base_dir.join(INDEX_FILE_NAME),
                base_dir: base_dir.to_path_buf(),
                ..Index::default()
            },
            index_lock: IndexLock::default(),
            base_dir: base_dir.to_path_buf(),
        }
    }

    // TODO: reject app codes that are not valid CTI vendor.package pairs
    pub fn with_app_code(mut self, app_code: &str) -> Self {
        self.index.app_code = app_code.to_string();
        self
    }

    pub fn with_ramlx_version(mut self, version: &str) -> Self {
        self.index.ramlx_version = version.to_string();
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.index.entities = entities;
        self
    }

    /// Load the manifest at `index_path` and the lock next to it.
    pub fn open(index_path: &Path) -> Result<Self> {
        let index = Index::read(index_path)?;
        let base_dir = index.base_dir.clone();
        let index_lock = IndexLock::read(&base_dir)?;
        Ok(Package {
            index,
            index_lock,
            base_dir,
        })
    }

    /// Load the package rooted at `base_dir`.
    pub fn read(base_dir: &Path) -> Result<Self> {
        Self::open(&base_dir.join(INDEX_FILE_NAME))
    }

    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join(INDEX_FILE_NAME)
    }

    pub fn save_index(&self) -> Result<()> {
        self.index.save(&self.base_dir)
    }

    pub fn save_index_lock(&self) -> Result<()> {
        self.index_lock.save(&self.base_dir)
    }
}
