use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::depend::dependency_name;
use crate::package::error::{PackageError, Result};
use crate::package::{read_file, write_file_atomic};

pub const INDEX_LOCK_FILE_NAME: &str = "index-lock.json";
pub const INDEX_LOCK_VERSION: &str = "1.0";

// ─── Data Types ────────────────────────────────────────────────────

/// A resolved dependency as recorded in the lock.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageLock {
    /// Installed identifier: the directory name under `.dep/`.
    pub app_code: String,
    /// The dependency's own specs at install time.
    #[serde(default)]
    pub depends: Vec<String>,
}

/// Where a locked dependency came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub integrity: String,
}

/// Source name → lock entry, with the reverse index on installed identifier.
///
/// Both directions are updated together; one installed identifier can never
/// be bound to two source names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, PackageLock>",
    into = "BTreeMap<String, PackageLock>"
)]
pub struct LockTable {
    by_source: BTreeMap<String, PackageLock>,
    by_app_code: BTreeMap<String, String>,
}

impl LockTable {
    pub fn get(&self, source_name: &str) -> Option<&PackageLock> {
        self.by_source.get(source_name)
    }

    /// Source name bound to an installed identifier.
    pub fn source_for(&self, app_code: &str) -> Option<&str> {
        self.by_app_code.get(app_code).map(String::as_str)
    }

    pub fn contains(&self, source_name: &str) -> bool {
        self.by_source.contains_key(source_name)
    }

    /// Bind `source_name` to `lock`, returning the entry it replaced.
    pub fn insert(&mut self, source_name: &str, lock: PackageLock) -> Result<Option<PackageLock>> {
        if let Some(existing) = self.by_app_code.get(&lock.app_code) {
            if existing != source_name {
                return Err(PackageError::LockConflict {
                    app_code: lock.app_code,
                    existing: existing.clone(),
                    source_name: source_name.to_string(),
                });
            }
        }
        let previous = self.remove(source_name);
        self.by_app_code
            .insert(lock.app_code.clone(), source_name.to_string());
        self.by_source.insert(source_name.to_string(), lock);
        Ok(previous)
    }

    pub fn remove(&mut self, source_name: &str) -> Option<PackageLock> {
        let previous = self.by_source.remove(source_name)?;
        self.by_app_code.remove(&previous.app_code);
        Some(previous)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PackageLock)> {
        self.by_source.iter()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &String> {
        self.by_source.keys()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

impl TryFrom<BTreeMap<String, PackageLock>> for LockTable {
    type Error = PackageError;

    fn try_from(entries: BTreeMap<String, PackageLock>) -> Result<Self> {
        let mut table = LockTable::default();
        for (source_name, lock) in entries {
            table.insert(&source_name, lock)?;
        }
        Ok(table)
    }
}

impl From<LockTable> for BTreeMap<String, PackageLock> {
    fn from(table: LockTable) -> Self {
        table.by_source
    }
}

/// The lock snapshot: everything the last successful install resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLock {
    pub version: String,
    #[serde(default)]
    pub packages: LockTable,
    #[serde(default)]
    pub dependent_bundles: BTreeMap<String, String>,
    #[serde(default)]
    pub source_info: BTreeMap<String, SourceInfo>,
}

impl Default for IndexLock {
    fn default() -> Self {
        Self {
            version: INDEX_LOCK_VERSION.to_string(),
            packages: LockTable::default(),
            dependent_bundles: BTreeMap::new(),
            source_info: BTreeMap::new(),
        }
    }
}

// ─── Lockfile I/O ──────────────────────────────────────────────────

impl IndexLock {
    /// Load `index-lock.json` from a package directory. A missing file is an
    /// empty lock.
    pub fn read(base_dir: &Path) -> Result<IndexLock> {
        let path = base_dir.join(INDEX_LOCK_FILE_NAME);
        if !path.exists() {
            return Ok(IndexLock::default());
        }
        let content = read_file(&path)?;
        serde_json::from_slice(&content).map_err(|source| PackageError::Json { path, source })
    }

    /// Write the lock with deterministic formatting.
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(INDEX_LOCK_FILE_NAME);
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

    // ─── Mutation ──────────────────────────────────────────────

    /// Record a resolved dependency under its source name.
    pub fn record(&mut self, source_name: &str, lock: PackageLock, info: SourceInfo) -> Result<()> {
        let app_code = lock.app_code.clone();
        if let Some(previous) = self.packages.insert(source_name, lock)? {
            if previous.app_code != app_code {
                self.dependent_bundles.remove(&previous.app_code);
            }
        }
        self.dependent_bundles.insert(app_code, info.version.clone());
        self.source_info.insert(source_name.to_string(), info);
        Ok(())
    }

    /// Drop everything recorded for `source_name`.
    pub fn forget(&mut self, source_name: &str) {
        if let Some(previous) = self.packages.remove(source_name) {
            self.dependent_bundles.remove(&previous.app_code);
        }
        self.source_info.remove(source_name);
    }

    /// Keep only entries reachable from `roots` through locked `depends`.
    /// Returns the source names that were dropped.
    pub fn prune(&mut self, roots: &[String]) -> Vec<String> {
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = roots
            .iter()
            .map(|spec| dependency_name(spec).to_string())
            .collect();
        while let Some(name) = queue.pop_front() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            if let Some(lock) = self.packages.get(&name) {
                queue.extend(lock.depends.iter().map(|d| dependency_name(d).to_string()));
            }
        }

        let stale: Vec<String> = self
            .packages
            .source_names()
            .chain(self.source_info.keys())
            .filter(|name| !reachable.contains(*name))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for name in &stale {
            self.forget(name);
        }
        stale
    }
}
