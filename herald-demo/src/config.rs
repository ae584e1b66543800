//! Configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use herald_types::HeraldConfig;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "HERALD_CONFIG";

/// Environment variable overriding the debug toggle.
pub const DEBUG_ENV: &str = "HERALD_DEBUG";

/// Load the config named by `HERALD_CONFIG`, or defaults when unset, then
/// apply `HERALD_DEBUG`.
pub fn load_config() -> Result<HeraldConfig> {
    let mut config = match env::var_os(CONFIG_ENV) {
        Some(path) => read_config(Path::new(&path))?,
        None => HeraldConfig::default(),
    };

    if let Ok(value) = env::var(DEBUG_ENV) {
        apply_debug_override(&mut config, &value);
    }

    Ok(config)
}

pub fn read_config(path: &Path) -> Result<HeraldConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse a JSON config. Missing fields take their defaults.
pub fn parse_config(text: &str) -> Result<HeraldConfig> {
    Ok(serde_json::from_str(text)?)
}

fn apply_debug_override(config: &mut HeraldConfig, value: &str) {
    config.debug = matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    );
}
