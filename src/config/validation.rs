use crate::config::types::{Config, OutputConfig, ScraperConfig, UserAgentConfig};
use crate::url::is_valid_url;
use crate::ConfigError;
use url::Url;

/// Checks every section; the first problem found is returned
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_batching(&config.scraper, &config.output)?;
    Ok(())
}

/// Validates scrape run configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    is_valid_url(&config.homepage).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "{}\nPlease adhere to URL format, e.g. https://example.com",
            e
        ))
    })?;

    if let Some(batch_size) = config.batch_size {
        if batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch_size must be a positive integer".to_string(),
            ));
        }
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// The crawler name is also the robots.txt product token: letters, digits
/// and hyphens only
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    let name = config.crawler_name.as_str();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "crawler-name must be a non-empty token of letters, digits and hyphens, got '{}'",
            name
        )));
    }

    Url::parse(&config.contact_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("contact-url '{}': {}", config.contact_url, e))
    })?;

    if !is_plausible_email(&config.contact_email) {
        return Err(ConfigError::Validation(format!(
            "contact-email must look like name@domain.tld, got '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

/// Configured file names must all be JSON files
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(output_file) = &config.output_file {
        validate_json_path("output_file", output_file)?;
    }

    if let Some(input_file) = &config.input_file {
        validate_json_path("input_file", input_file)?;
    }

    if let Some(exclusions_file) = &config.exclusions_file {
        validate_json_path("exclusions_file", exclusions_file)?;
    }

    Ok(())
}

/// Batched writes need a file to write to
fn validate_batching(scraper: &ScraperConfig, output: &OutputConfig) -> Result<(), ConfigError> {
    if scraper.batch_size.is_some() && output.output_file.is_none() {
        return Err(ConfigError::Validation(
            "Writing batches requires having an output file to write to".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a configured file path names a JSON file
pub(crate) fn validate_json_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.ends_with(".json") {
        return Err(ConfigError::Validation(format!(
            "{} must be of json format, e.g. 'example.json', got '{}'",
            field, path
        )));
    }
    Ok(())
}

/// `local@domain.tld` with exactly one `@` and a dotted domain
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() > 1
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}
