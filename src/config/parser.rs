use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a trawl configuration from a TOML file and validates it
///
/// # Errors
///
/// * `ConfigError::Io` - The file cannot be read
/// * `ConfigError::Parse` - The file is not valid TOML for [`Config`]
/// * `ConfigError::Validation` / `ConfigError::InvalidUrl` - A value is rejected
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use recipe_trawl::config::load_config;
///
/// let config = load_config(Path::new("trawl.toml")).unwrap();
/// println!("Homepage: {}", config.scraper.homepage);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of the raw configuration file
///
/// Logged at startup so runs can be matched to the configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let digest = Sha256::digest(std::fs::read(path)?);
    Ok(hex::encode(digest))
}

/// [`load_config`] plus [`compute_config_hash`] of the same file
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    Ok((load_config(path)?, compute_config_hash(path)?))
}
