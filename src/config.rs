//! Configuration loading and schema definitions for report-ci.
//!
//! Configuration is optional. Values given on the command line take
//! precedence over the file, which takes precedence over built-in defaults.

pub mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "report-ci.toml";

/// Loads configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - A value doesn't match the schema (e.g., an unknown framework)
///
/// # Example
///
/// ```no_run
/// use report_ci::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("report-ci.toml"))?;
/// println!("Include: {:?}", config.scan.include);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads configuration from a TOML string.
///
/// # Example
///
/// ```
/// use report_ci::config::load_config_str;
/// use report_ci::framework::Framework;
///
/// let config = load_config_str(r#"
///     [upload]
///     framework = "go"
/// "#)?;
///
/// assert_eq!(config.upload.framework, Some(Framework::GoTest));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}

/// Loads the configuration for a run.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is used
/// if present and defaults apply otherwise.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.is_file() {
        tracing::debug!("Loading {}", path.display());
        load_config(path)
    } else {
        Ok(Config::default())
    }
}
