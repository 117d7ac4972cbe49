use anyhow::anyhow;
use clap::Subcommand;
use ctipkg::cache;
use ctipkg::config::{Settings, CACHE_DIR_ENV};

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show the cache location and size
    Info,
    /// Remove every cached package
    Clean,
}

pub fn cmd_cache(action: CacheAction) -> anyhow::Result<()> {
    let dir = Settings::from_env()
        .cache_dir
        .ok_or_else(|| anyhow!("cannot determine the package cache directory (set {})", CACHE_DIR_ENV))?;

    match action {
        CacheAction::Info => {
            let stats = cache::stats(&dir);
            println!("Cache: {}", dir.display());
            println!("  {} packages, {} bytes", stats.entries, stats.total_bytes);
        }
        CacheAction::Clean => {
            let stats = cache::stats(&dir);
            cache::clear(&dir)?;
            println!("Removed {} cached packages from {}", stats.entries, dir.display());
        }
    }
    Ok(())
}
