use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Gateway base URL is set and timeout is not 0
/// - No page size or display limit is 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Gateway validation
    if config.gateway.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "gateway.base_url cannot be empty".to_string(),
        ));
    }
    if config.gateway.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.timeout_secs cannot be 0".to_string(),
        ));
    }

    let page_sizes = [
        ("search.preview_page_size", config.search.preview_page_size),
        ("feed.results_page_size", config.feed.results_page_size),
        ("feed.newest_page_size", config.feed.newest_page_size),
        ("feed.top_limit", config.feed.top_limit),
        ("feed.highlight_limit", config.feed.highlight_limit),
    ];
    for (name, value) in page_sizes {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    if config.feed.newest_display_limit == 0 {
        return Err(ConfigError::ValidationError(
            "feed.newest_display_limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let mut config = Config::default();
        config.gateway.base_url = "  ".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = Config::default();
        config.feed.newest_page_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("feed.newest_page_size"));
    }

    #[test]
    fn test_validate_zero_display_limit_fails() {
        let mut config = Config::default();
        config.feed.newest_display_limit = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
