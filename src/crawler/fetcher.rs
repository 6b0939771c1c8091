//! HTTP fetcher for the segmentation endpoint
//!
//! This module handles all HTTP requests for the sweep, including:
//! - Building the HTTP client with user agent and timeouts
//! - Constructing the per-page request URL from the segmentation parameters
//! - Classifying failures into transient (worth retrying) and permanent

use crate::config::{EndpointConfig, RetryConfig, SegmentationConfig};
use crate::crawler::extractor::PageEnvelope;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A fetch failure, classified by whether retrying can help
///
/// Transient failures (timeouts, connection errors, HTTP 429/5xx) go through
/// the bounded backoff loop; permanent failures (other 4xx, malformed bodies)
/// dead-letter the page immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

impl FetchError {
    /// Returns true if this failure is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Builds the HTTP client used for all page fetches
///
/// # Arguments
///
/// * `user_agent` - User-Agent header value
/// * `timeout_secs` - Per-request timeout in seconds
pub fn build_http_client(user_agent: &str, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the request URL for one segmentation page
///
/// The fixed filter parameters are appended to the base URL together with
/// the page number, mirroring the endpoint's expected query string.
pub fn build_page_url(
    endpoint: &EndpointConfig,
    segmentation: &SegmentationConfig,
    page: u32,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&endpoint.base_url)?;

    url.query_pairs_mut()
        .append_pair("revenueFrom", &segmentation.revenue_from.to_string())
        .append_pair("revenueTo", &segmentation.revenue_to.to_string())
        .append_pair("profitFrom", &segmentation.profit_from.to_string())
        .append_pair("profitTo", &segmentation.profit_to.to_string())
        .append_pair("companyType", &segmentation.company_type)
        .append_pair("page", &page.to_string());

    Ok(url)
}

/// Fetches and deserializes one segmentation page
///
/// # Failure classification
///
/// | Condition | Class |
/// |-----------|-------|
/// | Timeout, connection error | Transient |
/// | HTTP 429 | Transient |
/// | HTTP 5xx | Transient |
/// | Other non-success status | Permanent |
/// | Body fails to deserialize | Permanent |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The fully built page URL
pub async fn fetch_page(client: &Client, url: Url) -> Result<PageEnvelope, FetchError> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return Err(if e.is_timeout() {
                FetchError::Transient(format!("request timeout: {}", e))
            } else if e.is_connect() {
                FetchError::Transient(format!("connection error: {}", e))
            } else if e.is_builder() {
                FetchError::Permanent(format!("request build error: {}", e))
            } else {
                FetchError::Transient(format!("network error: {}", e))
            });
        }
    };

    let status = response.status();

    if status.as_u16() == 429 {
        return Err(FetchError::Transient("HTTP 429 rate limited".to_string()));
    }

    if status.is_server_error() {
        return Err(FetchError::Transient(format!("HTTP {}", status.as_u16())));
    }

    if !status.is_success() {
        return Err(FetchError::Permanent(format!("HTTP {}", status.as_u16())));
    }

    match response.json::<PageEnvelope>().await {
        Ok(envelope) => Ok(envelope),
        Err(e) if e.is_decode() => Err(FetchError::Permanent(format!(
            "malformed response body: {}",
            e
        ))),
        Err(e) => Err(FetchError::Transient(format!("body read error: {}", e))),
    }
}

/// Calculates the backoff delay before a retry attempt
///
/// The delay grows geometrically from `initial_backoff` by
/// `backoff_multiplier` per failed attempt and is capped at `max_backoff`.
/// `attempt` is 1-based: the delay after the first failure uses attempt 1.
pub fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let ms = retry.initial_backoff as f64 * retry.backoff_multiplier.powi(exponent);
    let capped = ms.min(retry.max_backoff as f64);
    Duration::from_millis(capped as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointConfig, SegmentationConfig};

    fn test_endpoint() -> EndpointConfig {
        EndpointConfig {
            base_url: "https://registry.example.com/segmentation.json".to_string(),
            start_page: 1,
            user_agent: "segment-sweep/0.1".to_string(),
        }
    }

    fn test_segmentation() -> SegmentationConfig {
        SegmentationConfig {
            revenue_from: 50_000,
            revenue_to: 150_000,
            profit_from: 500,
            profit_to: 87_067_716,
            company_type: "AB".to_string(),
        }
    }

    fn test_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 5,
            initial_backoff: 500,
            backoff_multiplier: 2.0,
            max_backoff: 60_000,
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client("segment-sweep/0.1", 30);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_page_url_includes_all_params() {
        let url = build_page_url(&test_endpoint(), &test_segmentation(), 7).unwrap();
        let query = url.query().unwrap();

        assert!(query.contains("revenueFrom=50000"));
        assert!(query.contains("revenueTo=150000"));
        assert!(query.contains("profitFrom=500"));
        assert!(query.contains("profitTo=87067716"));
        assert!(query.contains("companyType=AB"));
        assert!(query.contains("page=7"));
    }

    #[test]
    fn test_build_page_url_bad_base() {
        let mut endpoint = test_endpoint();
        endpoint.base_url = "not a url".to_string();
        assert!(build_page_url(&endpoint, &test_segmentation(), 1).is_err());
    }

    #[test]
    fn test_backoff_delay_grows_geometrically() {
        let retry = test_retry();

        assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(&retry, 2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&retry, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&retry, 4), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_delay_caps_at_max() {
        let retry = test_retry();

        // 500 * 2^9 = 256000ms, well past the 60s ceiling
        assert_eq!(backoff_delay(&retry, 10), Duration::from_millis(60_000));
    }

    #[test]
    fn test_backoff_delay_multiplier_one_is_constant() {
        let retry = RetryConfig {
            max_attempts: 3,
            initial_backoff: 250,
            backoff_multiplier: 1.0,
            max_backoff: 1000,
        };

        assert_eq!(backoff_delay(&retry, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(&retry, 5), Duration::from_millis(250));
    }

    #[test]
    fn test_fetch_error_classification() {
        assert!(FetchError::Transient("HTTP 500".to_string()).is_transient());
        assert!(!FetchError::Permanent("HTTP 404".to_string()).is_transient());
    }
}
