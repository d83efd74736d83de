//! Resilient fetch client for the album host
//!
//! Wraps an [`HttpClient`] with the pacing the album host tolerates: a browser
//! identity, a randomized pause before every non-probe request, and a bounded
//! wait-and-retry loop on `429 Too Many Requests`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::error::{GooglePhotosError, Result};

/// Browser identity sent with every request
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Pacing and retry policy
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Wait after attempt `n` is `backoff_step * n` unless the server says otherwise
    pub backoff_step: Duration,
    /// Lower bound of the randomized pre-request pause
    pub jitter_min: Duration,
    /// Upper bound (exclusive) of the randomized pre-request pause
    pub jitter_max: Duration,
    /// Per-request ceiling handed to the transport
    pub request_timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_secs(5),
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(1500),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl FetchPolicy {
    /// Policy without pauses, for tests and local mirrors
    pub fn immediate() -> Self {
        Self {
            backoff_step: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Source of the pauses taken before and between requests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// HTTP access to the album host with anti-throttling behavior
pub struct ResilientFetchClient {
    http_client: Arc<dyn HttpClient>,
    policy: FetchPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientFetchClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(http_client, FetchPolicy::default())
    }

    pub fn with_policy(http_client: Arc<dyn HttpClient>, policy: FetchPolicy) -> Self {
        Self {
            http_client,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the timer used for jitter and backoff pauses
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// GET with pre-request jitter
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.fetch(url, HttpMethod::Get).await
    }

    /// HEAD probe, sent without jitter
    pub async fn head(&self, url: &str) -> Result<HttpResponse> {
        self.fetch(url, HttpMethod::Head).await
    }

    /// Send a request, absorbing throttling.
    ///
    /// A `429` is never surfaced as an error: the request is retried up to the
    /// attempt ceiling and the last response is returned as-is, so callers
    /// must still check the status. Transport failures are retried with the
    /// same backoff and surface once the ceiling is reached.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str, method: HttpMethod) -> Result<HttpResponse> {
        if method != HttpMethod::Head {
            let pause = self.jitter();
            if !pause.is_zero() {
                debug!(jitter_ms = pause.as_millis() as u64, "Pacing request");
                self.sleeper.sleep(pause).await;
            }
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = HttpRequest::new(method, url)
                .header("User-Agent", BROWSER_USER_AGENT)
                .timeout(self.policy.request_timeout);

            match self.http_client.execute(request).await {
                Ok(response) if response.is_throttled() => {
                    if attempt >= max_attempts {
                        warn!(attempts = attempt, "Still rate limited, giving up");
                        return Ok(response);
                    }

                    let wait = self.throttle_delay(&response, attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited (429), retrying"
                    );
                    drop(response);
                    self.sleeper.sleep(wait).await;
                }
                Ok(response) => {
                    debug!(status = response.status, attempt, "Fetch complete");
                    return Ok(response);
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        warn!(attempts = attempt, error = %e, "Fetch failed");
                        return Err(GooglePhotosError::Transport {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }

                    let wait = self.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        wait_secs = wait.as_secs_f64(),
                        "Fetch failed, retrying"
                    );
                    self.sleeper.sleep(wait).await;
                }
            }
        }
    }

    /// Wait before retrying a throttled request.
    ///
    /// An integer `Retry-After` (seconds) wins; otherwise linear backoff.
    pub fn throttle_delay(&self, response: &HttpResponse, attempt: u32) -> Duration {
        response
            .header("Retry-After")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.backoff(attempt))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.policy.backoff_step * attempt
    }

    fn jitter(&self) -> Duration {
        let FetchPolicy {
            jitter_min,
            jitter_max,
            ..
        } = self.policy;
        if jitter_max <= jitter_min {
            return jitter_min;
        }
        rand::thread_rng().gen_range(jitter_min..jitter_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bytes::Bytes;
    use mockall::{mock, Sequence};
    use std::collections::HashMap;
    use std::sync::Mutex;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    /// Records requested pauses instead of sleeping
    #[derive(Default)]
    struct RecordingSleeper {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn pauses(&self) -> Vec<Duration> {
            self.pauses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn no_jitter() -> FetchPolicy {
        FetchPolicy {
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            ..FetchPolicy::default()
        }
    }

    fn response(status: u16, headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: Bytes::from_static(b"body"),
        }
    }

    #[tokio::test]
    async fn test_throttled_then_success() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(429, &[("retry-after", "2")])));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, &[])));

        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ResilientFetchClient::new(Arc::new(mock_http)).with_sleeper(sleeper.clone());
        let result = client.get("https://photos.app.goo.gl/abc").await.unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.body, Bytes::from_static(b"body"));

        // Jitter first, then the server-requested wait
        let pauses = sleeper.pauses();
        assert_eq!(pauses.len(), 2);
        assert!(pauses[0] >= Duration::from_millis(500) && pauses[0] < Duration::from_millis(1500));
        assert_eq!(pauses[1], Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_backoff_is_linear_per_attempt() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(5)
            .returning(|_| Ok(response(429, &[])));

        let sleeper = Arc::new(RecordingSleeper::default());
        let client =
            ResilientFetchClient::with_policy(Arc::new(mock_http), no_jitter()).with_sleeper(sleeper.clone());
        let result = client.get("https://photos.app.goo.gl/abc").await.unwrap();

        assert_eq!(result.status, 429);
        assert_eq!(
            sleeper.pauses(),
            [5, 10, 15, 20].map(Duration::from_secs).to_vec()
        );
    }

    #[tokio::test]
    async fn test_head_probe_skips_jitter() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, &[])));

        let sleeper = Arc::new(RecordingSleeper::default());
        let client = ResilientFetchClient::new(Arc::new(mock_http)).with_sleeper(sleeper.clone());
        client.head("https://lh3.example/a=d").await.unwrap();

        assert!(sleeper.pauses().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_exhaustion_returns_last_response() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(5)
            .returning(|_| Ok(response(429, &[])));

        let client = ResilientFetchClient::new(Arc::new(mock_http));
        let result = client.get("https://photos.app.goo.gl/abc").await.unwrap();

        assert_eq!(result.status, 429);
    }

    #[tokio::test]
    async fn test_requests_carry_browser_identity() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Head
                    && req.url == "https://lh3.example/a=d"
                    && req.headers.get("User-Agent").map(String::as_str) == Some(BROWSER_USER_AGENT)
            })
            .times(1)
            .returning(|_| Ok(response(200, &[])));

        let client = ResilientFetchClient::with_policy(Arc::new(mock_http), FetchPolicy::immediate());
        let result = client.head("https://lh3.example/a=d").await.unwrap();

        assert_eq!(result.status, 200);
    }

    #[tokio::test]
    async fn test_other_errors_are_returned_untouched() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(503, &[])));

        let client = ResilientFetchClient::with_policy(Arc::new(mock_http), FetchPolicy::immediate());
        let result = client.get("https://photos.app.goo.gl/abc").await.unwrap();

        assert_eq!(result.status, 503);
    }

    #[tokio::test]
    async fn test_transport_error_retried_then_surfaced() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(5)
            .returning(|_| Err(BridgeError::Transport("Connection failed".to_string())));

        let client = ResilientFetchClient::with_policy(Arc::new(mock_http), FetchPolicy::immediate());
        let err = client.get("https://photos.app.goo.gl/abc").await.unwrap_err();

        assert!(matches!(err, GooglePhotosError::Transport { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn test_transport_error_recovers() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::Transport("Request timed out".to_string())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, &[])));

        let client = ResilientFetchClient::with_policy(Arc::new(mock_http), FetchPolicy::immediate());
        assert_eq!(client.get("u").await.unwrap().status, 200);
    }

    #[test]
    fn test_throttle_delay() {
        let client = ResilientFetchClient::new(Arc::new(MockHttpClient::new()));

        assert_eq!(
            client.throttle_delay(&response(429, &[("Retry-After", "7")]), 1),
            Duration::from_secs(7)
        );
        assert_eq!(
            client.throttle_delay(&response(429, &[]), 3),
            Duration::from_secs(15)
        );
        // HTTP-date form is not understood; fall back to linear backoff
        assert_eq!(
            client.throttle_delay(
                &response(429, &[("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT")]),
                2
            ),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_jitter_window() {
        let client = ResilientFetchClient::new(Arc::new(MockHttpClient::new()));
        for _ in 0..100 {
            let pause = client.jitter();
            assert!(pause >= Duration::from_millis(500));
            assert!(pause < Duration::from_millis(1500));
        }

        let immediate =
            ResilientFetchClient::with_policy(Arc::new(MockHttpClient::new()), FetchPolicy::immediate());
        assert_eq!(immediate.jitter(), Duration::ZERO);
    }
}
