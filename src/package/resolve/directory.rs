use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};

use semver::{Version, VersionReq};
use tracing::{debug, info};

use super::{InstallContext, InstalledPackage, Resolution, Resolver};
use crate::package::cache::{entry_path, escape_name};
use crate::package::error::{PackageError, Result};
use crate::package::hash::tree_digest;
use crate::package::manifest::{parse_dependency, Index, PackageLock, SourceInfo, INDEX_FILE_NAME};

/// Scratch directory under `.dep/` where trees are assembled before being
/// moved into place.
pub const STAGING_DIR_NAME: &str = ".staging";

/// Resolves dependencies from a local registry directory laid out as
/// `<root>/<name>/<version>/index.json`.
#[derive(Clone, Debug)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Published versions of `name`.
    pub fn versions(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.root.join(name);
        let entries = std::fs::read_dir(&dir).map_err(|e| PackageError::Fetch {
            spec: name.to_string(),
            message: format!("not in registry {}: {}", self.root.display(), e),
        })?;
        let mut versions = Vec::new();
        for entry in entries.flatten() {
            if entry.path().join(INDEX_FILE_NAME).is_file() {
                if let Some(v) = entry.file_name().to_str() {
                    versions.push(v.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Copy one package version through the cache into `.dep/`.
    ///
    /// `claimed` maps identifiers already taken in this resolution to their
    /// source names. The identifier is checked before `.dep/` is touched.
    fn fetch(
        &self,
        ctx: &InstallContext<'_>,
        claimed: &BTreeMap<String, String>,
        name: &str,
        version: &str,
    ) -> Result<InstalledPackage> {
        let src = self.root.join(name).join(version);
        if !src.join(INDEX_FILE_NAME).is_file() {
            return Err(PackageError::Fetch {
                spec: format!("{}@{}", name, version),
                message: format!("{} has no {}", src.display(), INDEX_FILE_NAME),
            });
        }

        let cached = entry_path(ctx.package_cache_dir, name, version);
        if !cached.join(INDEX_FILE_NAME).is_file() {
            ctx.fs.replace_with_copy(&src, &cached)?;
            debug!(name, version, cache = %cached.display(), "staged in package cache");
        }

        let index = Index::read(&cached.join(INDEX_FILE_NAME))?;
        let app_code = if index.app_code.is_empty() {
            escape_name(name)
        } else {
            escape_name(&index.app_code)
        };
        check_identifier(name, version, &app_code)?;
        check_ownership(ctx, claimed, name, &app_code)?;
        let integrity = tree_digest(&cached)?;

        let staging = ctx.dependencies_dir.join(STAGING_DIR_NAME).join(&app_code);
        let installed_dir = ctx.dependencies_dir.join(&app_code);
        ctx.fs.replace_with_copy(&cached, &staging)?;
        ctx.fs.replace_with_move(&staging, &installed_dir)?;

        info!("Installed {}@{} into {}", name, version, installed_dir.display());
        Ok(InstalledPackage {
            source_name: name.to_string(),
            lock: PackageLock {
                app_code,
                depends: index.depends,
            },
            info: SourceInfo {
                source: src.display().to_string(),
                version: version.to_string(),
                integrity,
            },
        })
    }
}

impl Resolver for DirectoryResolver {
    fn download(
        &mut self,
        ctx: &InstallContext<'_>,
        depends: &[String],
        replace: bool,
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();
        let mut queue: VecDeque<(String, bool)> =
            depends.iter().map(|spec| (spec.clone(), true)).collect();

        while let Some((spec, is_root)) = queue.pop_front() {
            let (name, requirement) = parse_dependency(&spec);
            if name.is_empty() || !visited.insert(name.to_string()) {
                continue;
            }

            let locked = ctx
                .lock
                .packages
                .get(name)
                .and_then(|_| ctx.lock.source_info.get(name));
            let version = match locked {
                Some(info) if !(replace && is_root) => info.version.clone(),
                _ => select_version(name, &self.versions(name)?, requirement)?,
            };

            let installed = self
                .fetch(ctx, &claimed, name, &version)
                .map_err(|e| PackageError::for_dependency(name, e))?;
            claimed.insert(installed.lock.app_code.clone(), name.to_string());

            if let Some(previous) = ctx.lock.packages.get(name) {
                let previous_version = ctx.lock.source_info.get(name).map(|i| i.version.as_str());
                if previous.app_code != installed.lock.app_code || previous_version != Some(&version) {
                    resolution.replaced.insert(name.to_string());
                }
            }

            queue.extend(installed.lock.depends.iter().map(|d| (d.clone(), false)));
            resolution.installed.push(installed);
        }

        Ok(resolution)
    }
}

// ─── Installed Identifiers ─────────────────────────────────────────

/// An installed identifier must name exactly one plain entry under `.dep/`.
/// Dot-prefixed names are reserved for scratch space.
fn check_identifier(name: &str, version: &str, app_code: &str) -> Result<()> {
    let mut components = Path::new(app_code).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if app_code.is_empty() || app_code.starts_with('.') || !single {
        return Err(PackageError::Fetch {
            spec: format!("{}@{}", name, version),
            message: format!("'{}' is not a valid installed identifier", app_code),
        });
    }
    Ok(())
}

/// Each installed identifier belongs to one source name. A locked owner
/// that this resolution already moved elsewhere no longer holds it.
fn check_ownership(
    ctx: &InstallContext<'_>,
    claimed: &BTreeMap<String, String>,
    name: &str,
    app_code: &str,
) -> Result<()> {
    let conflict = |existing: &str| PackageError::LockConflict {
        app_code: app_code.to_string(),
        existing: existing.to_string(),
        source_name: name.to_string(),
    };
    if let Some(existing) = claimed.get(app_code) {
        if existing != name {
            return Err(conflict(existing));
        }
    }
    if let Some(existing) = ctx.lock.packages.source_for(app_code) {
        let moved = claimed.values().any(|owner| owner == existing);
        if existing != name && !moved {
            return Err(conflict(existing));
        }
    }
    Ok(())
}

// ─── Version Selection ─────────────────────────────────────────────

fn parse_version_loose(raw: &str) -> Option<Version> {
    let t = raw.trim();
    Version::parse(t.strip_prefix('v').unwrap_or(t)).ok()
}

fn parse_requirement_loose(raw: &str) -> Option<VersionReq> {
    let t = raw.trim();
    let t = match t.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => t,
    };
    VersionReq::parse(t).ok()
}

/// Pick a version of `name` from `candidates`.
///
/// An exact directory match wins; otherwise the highest semver version
/// satisfying `requirement`. An empty requirement takes the highest
/// version available.
pub fn select_version(name: &str, candidates: &[String], requirement: &str) -> Result<String> {
    if !requirement.is_empty() && candidates.iter().any(|c| c == requirement) {
        return Ok(requirement.to_string());
    }

    let no_match = || PackageError::NoMatchingVersion {
        name: name.to_string(),
        requirement: requirement.to_string(),
    };

    if requirement.is_empty() {
        let best_semver = candidates
            .iter()
            .filter_map(|c| parse_version_loose(c).map(|v| (v, c)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, c)| c.clone());
        return best_semver
            .or_else(|| candidates.iter().max().cloned())
            .ok_or_else(no_match);
    }

    let req = parse_requirement_loose(requirement).ok_or_else(no_match)?;
    candidates
        .iter()
        .filter_map(|c| parse_version_loose(c).map(|v| (v, c)))
        .filter(|(v, _)| req.matches(v))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, c)| c.clone())
        .ok_or_else(no_match)
}
