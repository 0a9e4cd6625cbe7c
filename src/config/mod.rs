mod schema;
mod validation;

pub use schema::{Config, ValidationConfig, DEFAULT_BANNED_PARTIES};
pub use validation::validate_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Get the config directory path (~/.config/votes-engine/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("votes-engine"))
}

/// Get the default config file path (~/.config/votes-engine/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/votes-engine/config.yaml)
///
/// A missing file at the default path gives the defaults. A missing file
/// that was asked for explicitly is an error.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        debug!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "chamber: lords\nvalidation:\n  sample_size: 10\n").unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.chamber, "lords");
        assert_eq!(config.validation.sample_size, 10);
        assert_eq!(config.validation.tolerance, 0.05);
        assert_eq!(config.banned_parties.len(), DEFAULT_BANNED_PARTIES.len());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_unknown_validation_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "validation:\n  samples: 10\n").unwrap();
        assert!(load_config(Some(path)).is_err());
    }
}
