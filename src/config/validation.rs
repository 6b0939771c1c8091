use crate::config::types::{
    Config, CrawlerConfig, EndpointConfig, FilterConfig, OutputConfig, RetryConfig,
    SegmentationConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.crawler.retry)?;
    validate_endpoint_config(&config.endpoint, &config.crawler)?;
    validate_segmentation_config(&config.segmentation)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_empty_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_empty_pages must be >= 1, got {}",
            config.max_empty_pages
        )));
    }

    Ok(())
}

/// Validates retry/backoff configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry.max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry.backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_backoff < config.initial_backoff {
        return Err(ConfigError::Validation(format!(
            "retry.max_backoff ({}ms) must be >= retry.initial_backoff ({}ms)",
            config.max_backoff, config.initial_backoff
        )));
    }

    Ok(())
}

/// Validates endpoint configuration
fn validate_endpoint_config(
    config: &EndpointConfig,
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.start_page > crawler.max_pages {
        return Err(ConfigError::Validation(format!(
            "start_page ({}) must not exceed max_pages ({})",
            config.start_page, crawler.max_pages
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates segmentation parameters
fn validate_segmentation_config(config: &SegmentationConfig) -> Result<(), ConfigError> {
    if config.revenue_from > config.revenue_to {
        return Err(ConfigError::Validation(format!(
            "revenue_from ({}) must not exceed revenue_to ({})",
            config.revenue_from, config.revenue_to
        )));
    }

    if config.profit_from > config.profit_to {
        return Err(ConfigError::Validation(format!(
            "profit_from ({}) must not exceed profit_to ({})",
            config.profit_from, config.profit_to
        )));
    }

    if config.company_type.is_empty() {
        return Err(ConfigError::Validation(
            "company_type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the keyword filter lists
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for kw in config.exclude_keywords.iter().chain(&config.exception_keywords) {
        if kw.trim().is_empty() {
            return Err(ConfigError::Validation(
                "filter keywords cannot be empty or whitespace".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;

    fn base_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                max_concurrent_fetches: 4,
                request_timeout: 30,
                page_delay: 1000,
                max_pages: 3000,
                max_empty_pages: 3,
                retry: RetryConfig {
                    max_attempts: 5,
                    initial_backoff: 500,
                    backoff_multiplier: 2.0,
                    max_backoff: 60_000,
                },
            },
            endpoint: EndpointConfig {
                base_url: "https://registry.example.com/segmentation.json".to_string(),
                start_page: 1,
                user_agent: "segment-sweep/0.1".to_string(),
            },
            segmentation: SegmentationConfig {
                revenue_from: 50_000,
                revenue_to: 150_000,
                profit_from: 500,
                profit_to: 87_067_716,
                company_type: "AB".to_string(),
            },
            filter: FilterConfig {
                exclude_keywords: vec!["Holdingverksamhet".to_string()],
                exception_keywords: vec![],
            },
            output: OutputConfig {
                database_path: "./sweep.db".to_string(),
                summary_path: "./summary.md".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = base_config();
        config.crawler.max_concurrent_fetches = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_scheme_rejected() {
        let mut config = base_config();
        config.endpoint.base_url = "ftp://registry.example.com/data".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_start_page_beyond_cap_rejected() {
        let mut config = base_config();
        config.endpoint.start_page = 5000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_revenue_range_rejected() {
        let mut config = base_config();
        config.segmentation.revenue_from = 200_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_ceiling_below_initial_rejected() {
        let mut config = base_config();
        config.crawler.retry.max_backoff = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_keyword_rejected() {
        let mut config = base_config();
        config.filter.exclude_keywords.push("   ".to_string());
        assert!(validate(&config).is_err());
    }
}
