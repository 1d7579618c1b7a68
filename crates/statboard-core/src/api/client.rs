//! HTTP client for the `/stats/list` endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{EntityLevel, Frequency, IndicatorApi, StatsResponse};

use super::{ApiError, StatsSource};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8090";

/// Path of the stats listing endpoint, relative to the base URL
const STATS_LIST_PATH: &str = "/stats/list";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Stats API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct StatsApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff_ms: u64,
}

impl StatsApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new client with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff_ms: self.initial_backoff_ms,
        }
    }

    /// Override the first rate-limit backoff delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = self.initial_backoff_ms;

        loop {
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    fn stats_query(
        api: IndicatorApi,
        since: &str,
        frequency: Frequency,
        entity_level: EntityLevel,
        entity_ids: &[String],
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("indicator", api.as_str().to_string()),
            ("from", since.to_string()),
            ("frequency", frequency.as_str().to_string()),
            ("entitylevel", entity_level.as_str().to_string()),
        ];
        query.extend(entity_ids.iter().map(|id| ("entity", id.clone())));
        query
    }

    /// Fetch records of one indicator endpoint for the given entities.
    pub async fn fetch_stats(
        &self,
        api: IndicatorApi,
        since: &str,
        frequency: Frequency,
        entity_level: EntityLevel,
        entity_ids: &[String],
    ) -> Result<Vec<StatsResponse>> {
        let url = format!("{}{}", self.base_url, STATS_LIST_PATH);
        let query = Self::stats_query(api, since, frequency, entity_level, entity_ids);

        let records: Vec<StatsResponse> = self
            .get(&url, &query)
            .await
            .with_context(|| format!("Failed to fetch {} stats", api))?;

        debug!(
            api = %api,
            frequency = %frequency,
            level = %entity_level,
            entities = entity_ids.len(),
            count = records.len(),
            "Fetched stats"
        );
        Ok(records)
    }
}

impl StatsSource for StatsApiClient {
    async fn get_stats(
        &self,
        api: IndicatorApi,
        since: &str,
        frequency: Frequency,
        entity_level: EntityLevel,
        entity_ids: &[String],
    ) -> Result<Vec<StatsResponse>> {
        self.fetch_stats(api, since, frequency, entity_level, entity_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn fast_client(server: &MockServer) -> StatsApiClient {
        StatsApiClient::new(server.uri())
            .expect("client")
            .with_initial_backoff(Duration::from_millis(1))
    }

    #[test]
    fn test_stats_query_repeats_entity() {
        let query = StatsApiClient::stats_query(
            IndicatorApi::Accounts,
            "2024-01-01T00:00:00Z",
            Frequency::Week,
            EntityLevel::Structure,
            &ids(&["a", "b"]),
        );
        assert_eq!(query[0], ("indicator", "accounts".to_string()));
        assert_eq!(query[2], ("frequency", "week".to_string()));
        assert_eq!(query[3], ("entitylevel", "structure".to_string()));
        assert_eq!(query[4], ("entity", "a".to_string()));
        assert_eq!(query[5], ("entity", "b".to_string()));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = StatsApiClient::new("http://stats.example.org/").unwrap();
        assert_eq!(client.base_url(), "http://stats.example.org");
    }

    #[tokio::test]
    async fn test_fetch_stats_sends_query_and_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stats/list"))
            .and(query_param("indicator", "access"))
            .and(query_param("from", "2024-01-01T00:00:00Z"))
            .and(query_param("frequency", "month"))
            .and(query_param("entitylevel", "structure"))
            .and(query_param("entity", "school-1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"date":"2024-01-01 00:00:00","profile":"Teacher","module":"Blog","type":"ACCESS","access":4}]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server).with_token("secret".to_string());
        let records = client
            .get_stats(
                IndicatorApi::Access,
                "2024-01-01T00:00:00Z",
                Frequency::Month,
                EntityLevel::Structure,
                &ids(&["school-1"]),
            )
            .await
            .expect("stats");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].module.as_deref(), Some("Blog"));
        assert_eq!(records[0].metric("access"), 4.0);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats/list"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fast_client(&server)
            .fetch_stats(IndicatorApi::Accounts, "x", Frequency::Day, EntityLevel::Platform, &[])
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_retry_on_429_then_success() {
        let server = MockServer::start().await;
        let attempt = AtomicU32::new(0);

        Mock::given(method("GET"))
            .and(path("/stats/list"))
            .respond_with(move |_: &wiremock::Request| {
                if attempt.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(429)
                } else {
                    ResponseTemplate::new(200).set_body_string("[]")
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let records = fast_client(&server)
            .fetch_stats(IndicatorApi::Accounts, "x", Frequency::Day, EntityLevel::Structure, &ids(&["1"]))
            .await
            .expect("retry should succeed");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats/list"))
            .respond_with(ResponseTemplate::new(429))
            .expect(u64::from(MAX_RATE_LIMIT_RETRIES + 1))
            .mount(&server)
            .await;

        let err = fast_client(&server)
            .fetch_stats(IndicatorApi::Accounts, "x", Frequency::Day, EntityLevel::Structure, &ids(&["1"]))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\":\"a list\"}"))
            .mount(&server)
            .await;

        let result = fast_client(&server)
            .fetch_stats(IndicatorApi::Accounts, "x", Frequency::Month, EntityLevel::Structure, &ids(&["1"]))
            .await;
        assert!(result.is_err());
    }
}
