use tracing::{debug, info, warn};

use super::PackageManager;
use crate::package::error::{PackageError, Result};
use crate::package::manifest::{Index, INDEX_FILE_NAME};
use crate::schema::{BasicValidator, Validator, Violation, METADATA_CACHE_FILE};

impl PackageManager {
    /// Validate the package and its locked dependencies with the structural
    /// [`BasicValidator`].
    pub fn validate(&self) -> Result<Vec<Violation>> {
        self.validate_with(&mut BasicValidator::new())
    }

    /// Validate with a caller-supplied validator.
    ///
    /// `Err` means validation could not run (unreadable dictionary, missing
    /// dependency cache); violations found in the entity set are returned
    /// as data, and an empty list means the package is valid.
    pub fn validate_with(&self, validator: &mut dyn Validator) -> Result<Vec<Violation>> {
        let dictionaries = self.package.dictionaries()?;
        debug!(languages = dictionaries.dictionaries.len(), "loaded dictionaries");

        let parsed = self.parser.parse_package(&self.index_path())?;
        parsed.dump_cache()?;
        validator.add_entities(parsed.registry.total())?;

        for (name, lock) in self.package.index_lock.packages.iter() {
            let index_path = self.dependencies_dir.join(&lock.app_code).join(INDEX_FILE_NAME);
            let index = Index::read(&index_path).map_err(|e| PackageError::for_dependency(name, e))?;
            validator
                .add_from_file(&index.base_dir.join(METADATA_CACHE_FILE))
                .map_err(|e| PackageError::for_dependency(name, e.into()))?;
        }

        let violations = validator.validate_all();
        if violations.is_empty() {
            info!("Validation passed");
        } else {
            warn!(count = violations.len(), "validation found problems");
        }
        Ok(violations)
    }
}
