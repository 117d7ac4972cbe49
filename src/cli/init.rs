use std::path::PathBuf;

use anyhow::{bail, Context};
use ctipkg::manifest::INDEX_FILE_NAME;
use ctipkg::Package;

pub fn cmd_init(
    dir: Option<PathBuf>,
    app_code: Option<String>,
    ramlx_version: Option<String>,
) -> anyhow::Result<()> {
    let dir = match dir {
        Some(d) => d,
        None => std::env::current_dir().context("cannot read current directory")?,
    };
    let index_path = dir.join(INDEX_FILE_NAME);
    if index_path.exists() {
        bail!("'{}' already exists", index_path.display());
    }
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create directory '{}'", dir.display()))?;

    let mut package = Package::new(&dir);
    if let Some(code) = app_code.as_deref() {
        package = package.with_app_code(code);
    }
    if let Some(version) = ramlx_version.as_deref() {
        package = package.with_ramlx_version(version);
    }
    package.save_index()?;

    eprintln!("Created package in {}", dir.display());
    eprintln!("  {}", INDEX_FILE_NAME);
    Ok(())
}
