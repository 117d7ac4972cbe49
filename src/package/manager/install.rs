use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{PackageManager, DEPENDENCY_DIR_NAME};
use crate::package::error::{PackageError, Result};
use crate::package::manifest::{dependency_name, IndexLock, INDEX_FILE_NAME};
use crate::package::resolve::{InstallContext, InstalledPackage};

impl PackageManager {
    /// Install `depends` and record them as direct dependencies.
    ///
    /// Returns the source names of everything installed, transitive
    /// dependencies included. The manifest and lock are written only after
    /// the install succeeded.
    pub fn install_new_dependencies(&mut self, depends: &[String], replace: bool) -> Result<Vec<String>> {
        let (installed, replaced) = self.install_dependencies(depends, replace)?;

        let (merged, added) = merge_depends(&self.package.index.depends, depends, &replaced);
        for spec in &added {
            info!("Added {} as direct dependency", spec);
        }
        self.package.index.depends = merged;
        self.prune_lock();

        self.package.save_index()?;
        self.package.save_index_lock()?;
        Ok(installed)
    }

    /// Install what the manifest already declares, keeping locked versions.
    /// Only the lock is written.
    pub fn install_index_dependencies(&mut self) -> Result<Vec<String>> {
        let depends = self.package.index.depends.clone();
        let (installed, _) = self.install_dependencies(&depends, false)?;
        self.prune_lock();
        self.package.save_index_lock()?;
        Ok(installed)
    }

    fn install_dependencies(
        &mut self,
        depends: &[String],
        replace: bool,
    ) -> Result<(Vec<String>, BTreeSet<String>)> {
        let ctx = InstallContext {
            dependencies_dir: &self.dependencies_dir,
            package_cache_dir: &self.package_cache_dir,
            lock: &self.package.index_lock,
            fs: &*self.fs,
        };
        let resolution = self
            .resolver
            .download(&ctx, depends, replace)
            .map_err(|e| PackageError::Download {
                specs: depends.join(", "),
                source: Box::new(e),
            })?;

        let mut lock = self.package.index_lock.clone();
        for name in &resolution.replaced {
            lock.forget(name);
        }
        for pkg in &resolution.installed {
            lock.record(&pkg.source_name, pkg.lock.clone(), pkg.info.clone())?;
        }

        self.process_installed_dependencies(&lock, &resolution.installed)?;

        self.package.index_lock = lock;
        Ok((resolution.installed_names(), resolution.replaced))
    }

    /// Point each installed dependency's own `.dep/` entries at the shared
    /// installs and rebuild its metadata cache.
    fn process_installed_dependencies(&self, lock: &IndexLock, installed: &[InstalledPackage]) -> Result<()> {
        for pkg in installed {
            let name = pkg.source_name.as_str();
            let pkg_path = self.dependencies_dir.join(&pkg.lock.app_code);

            for dep in &pkg.lock.depends {
                let dep_name = dependency_name(dep);
                let dep_lock = lock.packages.get(dep_name).ok_or_else(|| {
                    PackageError::for_dependency(
                        name,
                        PackageError::NotLocked {
                            name: dep_name.to_string(),
                        },
                    )
                })?;
                let target = self.dependencies_dir.join(&dep_lock.app_code);
                let link = pkg_path.join(DEPENDENCY_DIR_NAME).join(&dep_lock.app_code);
                self.fs
                    .link_dir(&target, &link)
                    .map_err(|e| PackageError::for_dependency(name, e))?;
            }

            let cache = self
                .parser
                .build_package_cache(&pkg_path.join(INDEX_FILE_NAME))
                .map_err(|e| PackageError::for_dependency(name, e.into()))?;
            debug!(dependency = name, cache = %cache.display(), "processed");
        }
        Ok(())
    }

    fn prune_lock(&mut self) {
        let dropped = self.package.index_lock.prune(&self.package.index.depends);
        for name in dropped {
            debug!(dependency = %name, "dropped from lock: no longer reachable");
        }
    }
}

/// Merge requested specs into the manifest's dependency list.
///
/// Specs in `existing` whose name was replaced are substituted in place by
/// the requested spec of that name, or dropped when none was requested.
/// Requested specs with a new name are appended in first-seen order.
/// Returns the merged list and the appended specs.
pub fn merge_depends(
    existing: &[String],
    requested: &[String],
    replaced: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let requested_spec = |name: &str| requested.iter().find(|spec| dependency_name(spec) == name);

    let mut merged = Vec::with_capacity(existing.len() + requested.len());
    let mut present: BTreeSet<&str> = BTreeSet::new();
    for spec in existing {
        let name = dependency_name(spec);
        if replaced.contains(name) {
            match requested_spec(name) {
                Some(new_spec) if present.insert(name) => merged.push(new_spec.clone()),
                _ => {}
            }
        } else {
            present.insert(name);
            merged.push(spec.clone());
        }
    }

    let mut added = Vec::new();
    for spec in requested {
        let name = dependency_name(spec);
        if name.is_empty() || !present.insert(name) {
            continue;
        }
        merged.push(spec.clone());
        added.push(spec.clone());
    }
    (merged, added)
}
