use serde::Deserialize;

/// Main configuration structure for segment-sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub endpoint: EndpointConfig,
    pub segmentation: SegmentationConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent page workers
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Sleep after each processed page (milliseconds)
    #[serde(rename = "page-delay")]
    pub page_delay: u64,

    /// Highest page number the sweep will ever request
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Consecutive empty pages before the sweep stops
    #[serde(rename = "max-empty-pages")]
    pub max_empty_pages: u32,

    pub retry: RetryConfig,
}

/// Bounded exponential backoff settings for transient page failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts before a page is dead-lettered
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff delay (milliseconds)
    #[serde(rename = "initial-backoff")]
    pub initial_backoff: u64,

    /// Multiplier applied to the delay after each failed attempt
    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: f64,

    /// Ceiling for the backoff delay (milliseconds)
    #[serde(rename = "max-backoff")]
    pub max_backoff: u64,
}

/// Segmentation endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the segmentation JSON endpoint
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Page number the sweep starts from on a fresh run
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_start_page() -> u32 {
    1
}

fn default_user_agent() -> String {
    "segment-sweep/0.1".to_string()
}

/// Fixed filter parameters sent with every page request
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    #[serde(rename = "revenue-from")]
    pub revenue_from: i64,

    #[serde(rename = "revenue-to")]
    pub revenue_to: i64,

    #[serde(rename = "profit-from")]
    pub profit_from: i64,

    #[serde(rename = "profit-to")]
    pub profit_to: i64,

    #[serde(rename = "company-type")]
    pub company_type: String,
}

/// Category keyword filter lists
///
/// Single source of truth for the exclusion rules; every consumer reads
/// these lists from here instead of carrying its own copy.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// A company is dropped when any of its categories contains one of these
    #[serde(rename = "exclude-keywords", default)]
    pub exclude_keywords: Vec<String>,

    /// A company is always kept when any of its categories contains one of these
    #[serde(rename = "exception-keywords", default)]
    pub exception_keywords: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}
