//! Configuration management for the CLI

use anyhow::{Context, Result};
use idle_lib::AnalyzerConfig;
use std::path::{Path, PathBuf};

/// Environment prefix, e.g. `RSIDLE_COST__PREMIUM_FACTOR=1.2`
const ENV_PREFIX: &str = "RSIDLE";

/// Load analyzer configuration
///
/// Sources in increasing priority: the explicit `--config` file (or the
/// default file if it exists), then `RSIDLE_*` environment variables.
pub fn load(explicit: Option<&Path>) -> Result<AnalyzerConfig> {
    let mut builder = config::Config::builder();

    match explicit {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(config::File::from(path).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load configuration")?;

    settings
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// `~/.config/rsidle/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("rsidle").join("config.toml"))
}
