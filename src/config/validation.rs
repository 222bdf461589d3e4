use crate::config::types::{
    Config, CrawlerConfig, ForumConfig, OutputConfig, SelectorConfig, UserAgentConfig,
};
use crate::crawler::compile_selector;
use crate::ConfigError;
use url::Url;

/// Upper bound for `max-concurrent-topics`
const MAX_CONCURRENT_TOPICS: u32 = 32;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_forum_config(&config.forum)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the forum locations
fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("start-url", &config.start_url)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // Page caps are the only guard against cyclic or endless next-link chains
    if config.max_listing_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_listing_pages must be >= 1, got {}",
            config.max_listing_pages
        )));
    }

    if config.max_topic_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_topic_pages must be >= 1, got {}",
            config.max_topic_pages
        )));
    }

    if config.max_concurrent_topics < 1 || config.max_concurrent_topics > MAX_CONCURRENT_TOPICS {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_topics must be between 1 and {}, got {}",
            MAX_CONCURRENT_TOPICS, config.max_concurrent_topics
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Checks that every selector compiles
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in [
        &config.topic_title,
        &config.next_page,
        &config.post,
        &config.author,
        &config.date,
        &config.content,
    ] {
        compile_selector(selector)?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses `value` and requires an HTTP(S) scheme
fn validate_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(url)
}
