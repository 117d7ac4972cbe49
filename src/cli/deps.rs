use std::collections::BTreeSet;
use std::path::Path;

use anyhow::bail;
use clap::Subcommand;
use ctipkg::manifest::{parse_dependency, INDEX_FILE_NAME};
use ctipkg::schema::METADATA_CACHE_FILE;
use ctipkg::Package;

use super::locate_index;

#[derive(Subcommand)]
pub enum DepsAction {
    /// Show declared dependencies and lock status
    List,
    /// Verify every locked dependency is installed with its metadata cache
    Check,
}

pub fn cmd_deps(index: Option<&Path>, action: DepsAction) -> anyhow::Result<()> {
    let package = Package::open(&locate_index(index)?)?;
    match action {
        DepsAction::List => list(&package),
        DepsAction::Check => check(&package),
    }
}

fn list(package: &Package) -> anyhow::Result<()> {
    let depends = &package.index.depends;
    if depends.is_empty() {
        println!("No dependencies declared in {}.", INDEX_FILE_NAME);
        return Ok(());
    }
    let lock = &package.index_lock;
    println!("Dependencies ({}):", depends.len());
    for spec in depends {
        let (name, requirement) = parse_dependency(spec);
        let requirement = if requirement.is_empty() { "*" } else { requirement };
        match (lock.packages.get(name), lock.source_info.get(name)) {
            (Some(entry), Some(info)) => println!(
                "  {} {} -> {} as {}",
                name, requirement, info.version, entry.app_code
            ),
            _ => println!("  {} {} (not locked)", name, requirement),
        }
    }

    let direct: BTreeSet<&str> = depends.iter().map(|d| parse_dependency(d).0).collect();
    let transitive: Vec<&String> = lock
        .packages
        .source_names()
        .filter(|name| !direct.contains(name.as_str()))
        .collect();
    if !transitive.is_empty() {
        println!("\nTransitive ({}):", transitive.len());
        for name in transitive {
            let version = lock.source_info.get(name).map(|i| i.version.as_str());
            println!("  {} {}", name, version.unwrap_or("?"));
        }
    }
    Ok(())
}

fn check(package: &Package) -> anyhow::Result<()> {
    let deps_dir = package.base_dir.join(ctipkg::DEPENDENCY_DIR_NAME);
    let lock = &package.index_lock;
    if lock.packages.is_empty() {
        println!("No locked dependencies. Run `ctipkg install` to resolve.");
        return Ok(());
    }

    let mut missing = 0;
    for (name, entry) in lock.packages.iter() {
        let dir = deps_dir.join(&entry.app_code);
        if !dir.join(INDEX_FILE_NAME).is_file() {
            println!("  MISSING  {} ({})", name, entry.app_code);
            missing += 1;
        } else if !dir.join(METADATA_CACHE_FILE).is_file() {
            println!("  NO CACHE {} ({})", name, entry.app_code);
            missing += 1;
        } else {
            println!("  OK       {} ({})", name, entry.app_code);
        }
    }

    // Installed directories nothing in the lock refers to.
    if let Ok(entries) = std::fs::read_dir(&deps_dir) {
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str() else { continue };
            if !id.starts_with('.') && lock.packages.source_for(id).is_none() {
                println!("  STALE    {}", id);
            }
        }
    }

    if missing > 0 {
        bail!("{} dependencies missing or incomplete; run `ctipkg install`", missing);
    }
    println!("\nAll dependencies installed.");
    Ok(())
}
