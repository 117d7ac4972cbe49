use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{EntityDocument, Registry, SchemaError};

/// Well-known name of the derived metadata cache inside a package directory.
pub const METADATA_CACHE_FILE: &str = ".cache.json";

// ─── Parser Collaborator ───────────────────────────────────────────

/// Turns a package manifest into an entity registry.
pub trait SchemaParser {
    /// Parse the package whose manifest lives at `index_path`.
    fn parse_package(&self, index_path: &Path) -> Result<ParsedPackage, SchemaError>;

    /// Parse the package and persist its derived metadata cache.
    fn build_package_cache(&self, index_path: &Path) -> Result<PathBuf, SchemaError> {
        self.parse_package(index_path)?.dump_cache()
    }
}

/// A parsed package: its base directory and registry.
#[derive(Clone, Debug)]
pub struct ParsedPackage {
    pub base_dir: PathBuf,
    pub registry: Registry,
}

impl ParsedPackage {
    pub fn cache_path(&self) -> PathBuf {
        self.base_dir.join(METADATA_CACHE_FILE)
    }

    /// Write the registry to the package's metadata cache file.
    pub fn dump_cache(&self) -> Result<PathBuf, SchemaError> {
        let path = self.cache_path();
        let bytes = serde_json::to_vec_pretty(&self.registry.to_document()).map_err(|source| {
            SchemaError::Json {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&path, bytes).map_err(|source| SchemaError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(cache = %path.display(), entities = self.registry.len(), "dumped metadata cache");
        Ok(path)
    }
}

/// Read a metadata cache written by [`ParsedPackage::dump_cache`].
pub fn load_cache(path: &Path) -> Result<EntityDocument, SchemaError> {
    read_json(path)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SchemaError> {
    let content = std::fs::read(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| SchemaError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// ─── JSON Entity Files ─────────────────────────────────────────────

/// Parser for packages whose entity files are JSON [`EntityDocument`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSchemaParser;

/// The only part of the manifest the parser reads.
#[derive(Deserialize)]
struct ManifestEntities {
    #[serde(default)]
    entities: Vec<String>,
}

impl SchemaParser for JsonSchemaParser {
    fn parse_package(&self, index_path: &Path) -> Result<ParsedPackage, SchemaError> {
        let manifest: ManifestEntities = read_json(index_path)?;
        let base_dir = index_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut registry = Registry::default();
        for entity_file in &manifest.entities {
            let path = base_dir.join(entity_file);
            let doc: EntityDocument = read_json(&path)?;
            registry.add_document(doc, &path)?;
        }

        Ok(ParsedPackage { base_dir, registry })
    }
}
