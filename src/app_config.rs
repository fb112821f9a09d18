//! Configuration file loading for CLI defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fontgrab_core::Config;
use serde_json::Value;
use tracing::warn;

/// Builds the base configuration the command line is applied to.
///
/// Starts from the library defaults with progress output enabled, then
/// overlays the JSON file at `path` when one is given.
pub fn load_base_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config {
        verbose: true,
        ..Config::default()
    };
    if let Some(path) = path {
        let value = load_json(path)?;
        let dropped = config.merge_json(&value);
        for key in dropped {
            warn!(key = %key, file = %path.display(), "ignoring unknown or mistyped option");
        }
    }
    Ok(config)
}

fn load_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}
