use crate::config::types::Config;
use crate::config::validation::{validate, validate_seed};
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs against a changed configuration are easy to spot.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Builds the ordered seed list: inline `seeds` first, then `seeds-file`
///
/// Blank lines and lines starting with `#` in the seeds file are skipped.
/// Order is preserved; the frontier dispatches seeds exactly in this order.
pub fn load_seed_list(config: &Config) -> ConfigResult<Vec<String>> {
    let mut seeds: Vec<String> = config
        .crawler
        .seeds
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    if let Some(path) = &config.crawler.seeds_file {
        let content = std::fs::read_to_string(path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            validate_seed(line)?;
            seeds.push(line.to_string());
        }
    }

    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    Ok(seeds)
}
