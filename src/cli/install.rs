use std::path::{Path, PathBuf};

use anyhow::Context;
use ctipkg::config::Settings;

use super::open_manager;

pub fn cmd_install(
    index: Option<&Path>,
    specs: Vec<String>,
    replace: bool,
    registry: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let settings = Settings::from_env()
        .with_registry(registry)
        .with_cache_dir(cache_dir);
    let mut pm = open_manager(index, settings)?;

    let installed = if specs.is_empty() {
        pm.install_index_dependencies()
            .context("failed to install index dependencies")?
    } else {
        pm.install_new_dependencies(&specs, replace)
            .context("failed to install dependencies")?
    };

    if installed.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }
    println!("Installed {} dependencies:", installed.len());
    for name in &installed {
        match pm.package.index_lock.source_info.get(name) {
            Some(info) => println!("  {}@{}", name, info.version),
            None => println!("  {}", name),
        }
    }
    Ok(())
}
