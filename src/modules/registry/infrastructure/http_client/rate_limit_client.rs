//! HTTP client for the organisation registry with client-side rate limiting
//!
//! Every request waits on a governor quota first. Non-success answers are
//! turned into explicit error kinds here; retrying is left to the caller's
//! resilience pipeline.

use crate::shared::config::ApiOptions;
use crate::shared::errors::{AppError, AppResult};
use governor::{Jitter, Quota, RateLimiter as GovernorRateLimiter};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::debug;

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

/// Information extracted from HTTP 429 responses
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// How long to wait before next request (from Retry-After header)
    pub retry_after: Option<Duration>,
    /// When the rate limit resets (from X-RateLimit-Reset header)
    pub reset_time: Option<Duration>,
}

impl RateLimitInfo {
    /// Parse rate limit information from HTTP response headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let retry_after = headers
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let reset_time = headers
            .get("x-ratelimit-reset")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|timestamp| {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                Duration::from_secs(timestamp.saturating_sub(now))
            });

        Self {
            retry_after,
            reset_time,
        }
    }

    /// Get the best delay recommendation from available information
    pub fn recommended_delay(&self) -> Option<Duration> {
        self.retry_after.or(self.reset_time)
    }
}

/// Map a non-success status onto the error kinds the pipeline understands
pub fn error_for_status(
    status: StatusCode,
    headers: &HeaderMap,
    context: &str,
    body: &str,
) -> AppError {
    let detail = if body.trim().is_empty() {
        format!("{} returned {}", context, status)
    } else {
        format!("{} returned {}: {}", context, status, truncate(body, 200))
    };

    match status.as_u16() {
        429 => AppError::rate_limited(
            detail,
            RateLimitInfo::from_headers(headers).recommended_delay(),
        ),
        408 | 500..=599 => AppError::ExternalServiceError(detail),
        404 => AppError::NotFound(detail),
        409 => AppError::Conflict(detail),
        code => AppError::Upstream {
            status: code,
            message: detail,
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Rate limited JSON client bound to one registry base URL
pub struct RegistryHttpClient {
    client: Client,
    rate_limiter: DirectRateLimiter,
    base_url: String,
}

impl RegistryHttpClient {
    pub fn new(options: &ApiOptions) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rate_limiter: Self::create_rate_limiter(
                options.requests_per_second,
                options.burst_size,
            )?,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a rate limiter with specified requests per second and burst capacity
    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> AppResult<DirectRateLimiter> {
        if requests_per_second <= 0.0 {
            return Err(AppError::Configuration(
                "requests_per_second must be positive".to_string(),
            ));
        }
        let period = Duration::from_secs_f64(1.0 / requests_per_second);
        let burst = NonZeroU32::new(burst_size.max(1))
            .ok_or_else(|| AppError::Configuration("burst_size must be positive".to_string()))?;
        let quota = Quota::with_period(period)
            .ok_or_else(|| AppError::Configuration("Invalid rate limit period".to_string()))?
            .allow_burst(burst);

        Ok(GovernorRateLimiter::direct(quota))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a resource; 404 answers `None`
    pub async fn get_optional<T>(
        &self,
        context: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let request = self.client.request(Method::GET, self.url(path)).query(query);
        let response = self.send(context, request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(context, response).await?;
        Self::parse_json(context, response).await.map(Some)
    }

    /// GET a resource only to learn whether it exists
    pub async fn exists(&self, context: &str, path: &str) -> AppResult<bool> {
        let request = self.client.request(Method::GET, self.url(path));
        let response = self.send(context, request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(context, response).await?;
        Ok(true)
    }

    /// POST a JSON body and parse the JSON answer
    pub async fn post_json<B, T>(&self, context: &str, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.request(Method::POST, self.url(path)).json(body);
        let response = self.send(context, request).await?;
        let response = Self::ensure_success(context, response).await?;
        Self::parse_json(context, response).await
    }

    /// POST a JSON body, ignoring any answer body
    pub async fn post_unit<B>(&self, context: &str, path: &str, body: &B) -> AppResult<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.request(Method::POST, self.url(path)).json(body);
        let response = self.send(context, request).await?;
        Self::ensure_success(context, response).await?;
        Ok(())
    }

    async fn send(&self, context: &str, request: RequestBuilder) -> AppResult<Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let started = Instant::now();
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(AppError::from)?;

        debug!(
            operation = context,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Registry responded"
        );
        Ok(response)
    }

    async fn ensure_success(context: &str, response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &headers, context, &body))
    }

    async fn parse_json<T>(context: &str, response: Response) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let text = response.text().await.map_err(|e| {
            AppError::SerializationError(format!("Failed to read {} response: {}", context, e))
        })?;

        serde_json::from_str(&text).map_err(|e| {
            AppError::SerializationError(format!(
                "Failed to parse {} response: {}. Response: {}",
                context,
                e,
                truncate(&text, 200)
            ))
        })
    }
}
