use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use super::{is_cti, load_cache, parent_cti, Entity, SchemaError};

// ─── Violations ────────────────────────────────────────────────────

/// A problem found in the combined entity set. Violations are data, not errors.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Violation {
    MalformedIdentifier { cti: String },
    Duplicate { cti: String },
    UnknownType { cti: String, parent: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MalformedIdentifier { cti } => write!(f, "malformed identifier {}", cti),
            Violation::Duplicate { cti } => write!(f, "duplicate entity {}", cti),
            Violation::UnknownType { cti, parent } => {
                write!(f, "{} refers to unknown type {}", cti, parent)
            }
        }
    }
}

// ─── Validator Collaborator ────────────────────────────────────────

pub trait Validator {
    /// Seed the validator with entities from the package being validated.
    fn add_entities(&mut self, entities: Vec<Entity>) -> Result<(), SchemaError>;

    /// Load a dependency's metadata cache.
    fn add_from_file(&mut self, cache_path: &Path) -> Result<(), SchemaError>;

    /// Check the combined entity set.
    fn validate_all(&mut self) -> Vec<Violation>;
}

/// Structural checks only: identifier syntax, uniqueness, parent types.
#[derive(Debug, Default)]
pub struct BasicValidator {
    entities: Vec<Entity>,
}

impl BasicValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Validator for BasicValidator {
    fn add_entities(&mut self, entities: Vec<Entity>) -> Result<(), SchemaError> {
        self.entities.extend(entities);
        Ok(())
    }

    fn add_from_file(&mut self, cache_path: &Path) -> Result<(), SchemaError> {
        let doc = load_cache(cache_path)?;
        self.entities.extend(doc.into_entities());
        Ok(())
    }

    fn validate_all(&mut self) -> Vec<Violation> {
        let mut violations = BTreeSet::new();
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        let types: BTreeSet<&str> = self
            .entities
            .iter()
            .filter_map(|e| match e {
                Entity::Type(t) => Some(t.cti.as_str()),
                Entity::Instance(_) => None,
            })
            .collect();

        for entity in &self.entities {
            let cti = entity.cti();
            *seen.entry(cti).or_default() += 1;

            if !is_cti(cti) {
                violations.insert(Violation::MalformedIdentifier {
                    cti: cti.to_string(),
                });
                continue;
            }

            // Root types have no parent; everything else must derive from a known type.
            let parent = parent_cti(cti);
            let needs_parent = matches!(entity, Entity::Instance(_)) || parent.is_some();
            if needs_parent {
                let parent = parent.unwrap_or_default();
                if !types.contains(parent) {
                    violations.insert(Violation::UnknownType {
                        cti: cti.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        for (cti, count) in seen {
            if count > 1 {
                violations.insert(Violation::Duplicate {
                    cti: cti.to_string(),
                });
            }
        }

        violations.into_iter().collect()
    }
}
