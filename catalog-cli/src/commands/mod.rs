pub mod database;
pub mod serve;

use anyhow::{Context, Result};
use catalog_service::config::Config;
use std::path::Path;

/// Load configuration from `path` when given, otherwise from the search path
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}
