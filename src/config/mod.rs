//! Runtime settings.
//!
//! Values come from the environment and may be overridden by CLI flags:
//!
//! | Variable            | Setting      | Default                            |
//! |---------------------|--------------|------------------------------------|
//! | `CTIPKG_CACHE_DIR`  | `cache_dir`  | `<OS cache dir>/ctipkg/packages`   |
//! | `CTIPKG_REGISTRY`   | `registry`   | none; `install` then needs `--registry` |

use std::path::PathBuf;

use crate::package::cache::default_cache_dir;

pub const CACHE_DIR_ENV: &str = "CTIPKG_CACHE_DIR";
pub const REGISTRY_ENV: &str = "CTIPKG_REGISTRY";

#[cfg(test)]
mod tests;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// Package cache used to stage fetched dependencies.
    pub cache_dir: Option<PathBuf>,
    /// Local registry directory for the directory resolver.
    pub registry: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Settings {
            cache_dir: var(CACHE_DIR_ENV).or_else(default_cache_dir),
            registry: var(REGISTRY_ENV),
        }
    }

    pub fn with_registry(mut self, registry: Option<PathBuf>) -> Self {
        if registry.is_some() {
            self.registry = registry;
        }
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        if cache_dir.is_some() {
            self.cache_dir = cache_dir;
        }
        self
    }
}
