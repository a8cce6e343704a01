use crate::config::types::CaptureSettings;
use crate::ConfigError;
use regex::Regex;

/// Upper bound on in-flight asset fetches
const MAX_CONCURRENCY_LIMIT: usize = 64;

/// Upper bound on crawl depth
const MAX_DEPTH_LIMIT: u32 = 10;

/// Upper bound on pages per task
const MAX_PAGES_LIMIT: usize = 10_000;

/// Validates capture settings
pub fn validate(settings: &CaptureSettings) -> Result<(), ConfigError> {
    if settings.max_concurrency < 1 || settings.max_concurrency > MAX_CONCURRENCY_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, settings.max_concurrency
        )));
    }

    if settings.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, settings.max_depth
        )));
    }

    if settings.max_pages < 1 || settings.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, settings.max_pages
        )));
    }

    if settings.max_file_size_bytes == 0 {
        return Err(ConfigError::Validation(
            "max_file_size_bytes must be greater than 0".to_string(),
        ));
    }

    if settings.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            settings.request_timeout_secs
        )));
    }

    validate_user_agent(&settings.user_agent)?;

    for pattern in &settings.extra_ignore_patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}

/// Validates the user agent header value
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user_agent must not contain control characters, got '{}'",
            user_agent.escape_debug()
        )));
    }

    Ok(())
}
