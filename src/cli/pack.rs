use std::path::Path;

use anyhow::Context;
use ctipkg::config::Settings;

use super::open_manager;

pub fn cmd_pack(index: Option<&Path>) -> anyhow::Result<()> {
    let pm = open_manager(index, Settings::from_env())?;
    let bundle = pm.pack().context("failed to pack bundle")?;
    println!("Packed {}", bundle.display());
    Ok(())
}
