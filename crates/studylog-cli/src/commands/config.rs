use anyhow::{Context, Result};
use colored::Colorize;

use super::AppContext;

/// Prints the effective configuration (file plus environment) with the API key masked.
pub fn show(ctx: &AppContext) -> Result<()> {
    let mut config = ctx.config.clone();
    if config.inference.api_key.is_some() {
        config.inference.api_key = Some("********".to_string());
    }

    let text = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", format!("# {}", ctx.config_service.path().display()).bright_black());
    println!("{}", format!("# data_dir = {}", ctx.data_dir.display()).bright_black());
    print!("{}", text);
    Ok(())
}

pub fn path(ctx: &AppContext) {
    println!("{}", ctx.config_service.path().display());
}

pub fn init(ctx: &AppContext) -> Result<()> {
    let path = ctx.config_service.path();
    if ctx.config_service.ensure_config_file()? {
        println!("{}", format!("Wrote default configuration to {}", path.display()).green());
    } else {
        println!("{}", format!("{} already exists; left unchanged", path.display()).yellow());
    }
    Ok(())
}
