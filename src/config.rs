use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::bot::DEFAULT_TELEGRAM_API;
use crate::cli::Cli;
use crate::publish::{DEFAULT_PUBLISH_DELAY, PublishSettings};
use crate::telegraph::DEFAULT_TELEGRAPH_API;

pub const CATALOG_FILE_NAME: &str = "titles_and_links_alphabetical.csv";

/// Catalog path: `--catalog`, then `MOON_CATALOG`, then the working
/// directory, then the platform data directory.
pub fn resolve_catalog_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.catalog.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var("MOON_CATALOG") {
        return Ok(PathBuf::from(p));
    }

    let local = PathBuf::from(CATALOG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let in_data_dir = moon_catalog_home()?.join(CATALOG_FILE_NAME);
    if in_data_dir.exists() {
        return Ok(in_data_dir);
    }

    Ok(local)
}

pub fn resolve_token(flag: Option<&str>) -> Result<String> {
    if let Some(token) = flag {
        return Ok(token.to_string());
    }
    env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("Bot token missing: pass --token or set TELEGRAM_BOT_TOKEN")
}

pub fn resolve_telegram_api(flag: Option<&str>) -> String {
    flag.unwrap_or(DEFAULT_TELEGRAM_API).to_string()
}

pub fn resolve_telegraph_api(cli: &Cli) -> String {
    cli.telegraph_api
        .clone()
        .unwrap_or_else(|| DEFAULT_TELEGRAPH_API.to_string())
}

pub fn publish_settings(cli: &Cli) -> PublishSettings {
    PublishSettings {
        delay: cli
            .delay_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PUBLISH_DELAY),
        ..PublishSettings::default()
    }
}

fn moon_catalog_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("moon-catalog"))
}
