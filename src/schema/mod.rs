//! Entity registry model shared by the parser and validator collaborators.
//!
//! A package's entity files declare CTI *types* and *instances*. Parsing a
//! manifest yields a [`Registry`]; its serialized form is the derived
//! metadata cache (`.cache.json`) that validation and bundling consume
//! without re-parsing.
//!
//! CTI identifiers are `~`-separated chains: the parent type of
//! `cti.a.p.icon.v1.0~a.p.app.v1.0` is `cti.a.p.icon.v1.0`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod parser;
mod validator;

pub use parser::{load_cache, JsonSchemaParser, ParsedPackage, SchemaParser, METADATA_CACHE_FILE};
pub use validator::{BasicValidator, Validator, Violation};


// ─── Errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("duplicate entity {cti} in {}", .path.display())]
    Duplicate { cti: String, path: PathBuf },
}

// ─── CTI Identifiers ───────────────────────────────────────────────

pub const CTI_PREFIX: &str = "cti.";

/// Identifier of the immediate parent type, if the chain has one.
pub fn parent_cti(cti: &str) -> Option<&str> {
    cti.rfind('~').map(|idx| &cti[..idx])
}

/// Whether `cti` is a well-formed identifier chain.
pub fn is_cti(cti: &str) -> bool {
    let Some(rest) = cti.strip_prefix(CTI_PREFIX) else {
        return false;
    };
    !rest.is_empty()
        && rest.split('~').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        })
}

// ─── Data Types ────────────────────────────────────────────────────

/// Dotted path to a field inside an instance's values (`"icon"`, `"meta.logo"`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationKey(pub String);

impl AnnotationKey {
    /// Look up the value this key addresses.
    pub fn get_value<'a>(&self, values: &'a Value) -> Option<&'a Value> {
        let path = self.0.trim_start_matches('.');
        if path.is_empty() {
            return Some(values);
        }
        path.split('.')
            .try_fold(values, |current, field| current.get(field))
    }
}

/// Marks a field as a reference to a file shipped with the package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAnnotation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_types: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetAnnotation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub cti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<AnnotationKey, Annotation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub cti: String,
    #[serde(default)]
    pub values: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Type(TypeDef),
    Instance(Instance),
}

impl Entity {
    pub fn cti(&self) -> &str {
        match self {
            Entity::Type(t) => &t.cti,
            Entity::Instance(i) => &i.cti,
        }
    }
}

/// On-disk shape of entity files and of the metadata cache.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl EntityDocument {
    pub fn into_entities(self) -> Vec<Entity> {
        self.types
            .into_iter()
            .map(Entity::Type)
            .chain(self.instances.into_iter().map(Entity::Instance))
            .collect()
    }
}

// ─── Registry ──────────────────────────────────────────────────────

/// Types and instances declared by one package, keyed by CTI.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub types: BTreeMap<String, TypeDef>,
    pub instances: BTreeMap<String, Instance>,
}

impl Registry {
    /// Merge an entity document read from `path`. Identifiers must be unique
    /// across types and instances.
    pub fn add_document(&mut self, doc: EntityDocument, path: &Path) -> Result<(), SchemaError> {
        for ty in doc.types {
            if self.contains(&ty.cti) {
                return Err(SchemaError::Duplicate {
                    cti: ty.cti,
                    path: path.to_path_buf(),
                });
            }
            self.types.insert(ty.cti.clone(), ty);
        }
        for inst in doc.instances {
            if self.contains(&inst.cti) {
                return Err(SchemaError::Duplicate {
                    cti: inst.cti,
                    path: path.to_path_buf(),
                });
            }
            self.instances.insert(inst.cti.clone(), inst);
        }
        Ok(())
    }

    pub fn contains(&self, cti: &str) -> bool {
        self.types.contains_key(cti) || self.instances.contains_key(cti)
    }

    /// Every entity, types first.
    pub fn total(&self) -> Vec<Entity> {
        self.to_document().into_entities()
    }

    pub fn to_document(&self) -> EntityDocument {
        EntityDocument {
            types: self.types.values().cloned().collect(),
            instances: self.instances.values().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
