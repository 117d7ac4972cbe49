pub mod cache;
pub mod deps;
pub mod init;
pub mod install;
pub mod pack;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use ctipkg::config::{Settings, CACHE_DIR_ENV, REGISTRY_ENV};
use ctipkg::manifest::INDEX_FILE_NAME;
use ctipkg::package::resolve::{InstallContext, Resolution};
use ctipkg::{DirectoryResolver, PackageError, PackageManager, Resolver};

/// Walk up from `start_dir` to the nearest `index.json`.
pub fn find_index(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(INDEX_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// The manifest named by `--index`, or the nearest one upward from the
/// current directory.
pub fn locate_index(index: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = index {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    find_index(&cwd).ok_or_else(|| {
        anyhow!(
            "no {} found in {} or any parent (pass --index)",
            INDEX_FILE_NAME,
            cwd.display()
        )
    })
}

/// Open the package manager for the located manifest.
pub fn open_manager(index: Option<&Path>, settings: Settings) -> anyhow::Result<PackageManager> {
    let index_path = locate_index(index)?;
    let cache_dir = settings.cache_dir.ok_or_else(|| {
        anyhow!(
            "cannot determine the package cache directory (set {})",
            CACHE_DIR_ENV
        )
    })?;
    let resolver: Box<dyn Resolver> = match settings.registry {
        Some(registry) => Box::new(DirectoryResolver::new(registry)),
        None => Box::new(NoRegistry),
    };
    PackageManager::open(&index_path, cache_dir, resolver)
        .with_context(|| format!("cannot open package {}", index_path.display()))
}

/// Resolver used when no registry is configured: any fetch fails.
struct NoRegistry;

impl Resolver for NoRegistry {
    fn download(
        &mut self,
        _ctx: &InstallContext<'_>,
        depends: &[String],
        _replace: bool,
    ) -> ctipkg::Result<Resolution> {
        Err(PackageError::Fetch {
            spec: depends.join(", "),
            message: format!("no registry configured (set {} or pass --registry)", REGISTRY_ENV),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_index_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(INDEX_FILE_NAME), "{}").unwrap();

        assert_eq!(find_index(&nested), Some(tmp.path().join(INDEX_FILE_NAME)));
        assert_eq!(
            locate_index(Some(Path::new("x/index.json"))).unwrap(),
            PathBuf::from("x/index.json")
        );
    }
}
