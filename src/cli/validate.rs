use std::path::Path;

use anyhow::{bail, Context};
use ctipkg::config::Settings;

use super::open_manager;

pub fn cmd_validate(index: Option<&Path>) -> anyhow::Result<()> {
    let pm = open_manager(index, Settings::from_env())?;
    let violations = pm.validate().context("validation could not run")?;
    if violations.is_empty() {
        println!("OK: {} is valid", pm.package.index.app_code);
        return Ok(());
    }
    for v in &violations {
        println!("  {}", v);
    }
    bail!("{} validation problem(s)", violations.len())
}
