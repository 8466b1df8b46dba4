use crate::core::rate_limiter::RateLimiter;
use crate::domain::ports::{HttpRequest, HttpResponse, Transport, TransportError};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const BODY_SNIPPET_CHARS: usize = 200;

/// Row-local request failure; its text ends up in the `_error` column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} failed with HTTP {status}: {snippet}")]
    Status {
        url: String,
        status: u16,
        snippet: String,
    },

    #[error("Invalid JSON returned by {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid request URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            wait: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub timeout: Duration,
    /// Full `Authorization` header value.
    pub authorization: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            authorization: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// What one attempt means for the retry loop.
#[derive(Debug)]
enum Attempt {
    Success(String),
    Transient { error: RequestError, wait: Duration },
    Terminal(RequestError),
}

/// A 429 waits `Retry-After`, at least `retry_wait` and at most `max_wait`.
fn classify(
    url: &str,
    outcome: std::result::Result<HttpResponse, TransportError>,
    retry_wait: Duration,
    max_wait: Duration,
) -> Attempt {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            return Attempt::Transient {
                error: RequestError::Transport {
                    url: url.to_string(),
                    message: e.message,
                },
                wait: retry_wait,
            }
        }
    };

    let status_error = |response: &HttpResponse| RequestError::Status {
        url: url.to_string(),
        status: response.status,
        snippet: response.body.chars().take(BODY_SNIPPET_CHARS).collect(),
    };

    match response.status {
        200..=299 => Attempt::Success(response.body),
        429 => Attempt::Transient {
            error: status_error(&response),
            wait: response
                .retry_after
                .map_or(retry_wait, |ra| ra.max(retry_wait).min(max_wait)),
        },
        500..=599 => Attempt::Transient {
            error: status_error(&response),
            wait: retry_wait,
        },
        _ => Attempt::Terminal(status_error(&response)),
    }
}

/// Rate-limited, retrying JSON GET client shared by all registry endpoints.
pub struct RegistryClient {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    settings: ClientSettings,
}

impl RegistryClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: RateLimiter, settings: ClientSettings) -> Self {
        Self {
            transport,
            limiter,
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<T, RequestError> {
        let body = self.get(url, query).await?;
        serde_json::from_str(&body).map_err(|e| RequestError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET with at most `retries + 1` attempts; returns the 2xx body.
    pub async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<String, RequestError> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(auth) = &self.settings.authorization {
            headers.push(("Authorization".to_string(), auth.clone()));
        }
        let request = HttpRequest {
            url: url.to_string(),
            query: query.to_vec(),
            headers,
            timeout: self.settings.timeout,
        };

        let max_attempts = self.settings.retry.retries.saturating_add(1);
        let retry_wait = self.settings.retry.wait;
        let max_wait = self.settings.timeout.saturating_add(retry_wait);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.acquire().await;
            let outcome = self.transport.get(&request).await;
            match classify(url, outcome, retry_wait, max_wait) {
                Attempt::Success(body) => return Ok(body),
                Attempt::Terminal(error) => return Err(error),
                Attempt::Transient { error, .. } if attempt >= max_attempts => {
                    tracing::debug!("giving up on {} after {} attempts", url, attempt);
                    return Err(error);
                }
                Attempt::Transient { error, wait } => {
                    tracing::warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        max_attempts,
                        error,
                        wait
                    );
                    self.limiter.clock().sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request.
    struct ScriptedTransport {
        script: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<std::result::Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            request: &HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("script exhausted")))
        }
    }

    fn status(code: u16, body: &str) -> std::result::Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: code,
            body: body.to_string(),
            retry_after: None,
        })
    }

    fn client(
        transport: Arc<ScriptedTransport>,
        clock: &ManualClock,
        retries: u32,
        authorization: Option<&str>,
    ) -> RegistryClient {
        let limiter = RateLimiter::new(Arc::new(clock.clone()), 0.0, Duration::ZERO);
        RegistryClient::new(
            transport,
            limiter,
            ClientSettings {
                timeout: Duration::from_secs(5),
                authorization: authorization.map(str::to_string),
                retry: RetryPolicy {
                    retries,
                    wait: Duration::from_secs(1),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_server_errors_then_success_within_budget() {
        let transport = ScriptedTransport::new(vec![
            status(500, "boom"),
            status(503, "busy"),
            status(200, "{\"ok\":true}"),
        ]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 3, None);

        let value: serde_json::Value = client.get_json("http://registry/x", &[]).await.unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(transport.calls(), 3);
        assert_eq!(clock.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_keeps_last_error() {
        let transport = ScriptedTransport::new(vec![
            status(500, "one"),
            Err(TransportError::new("timed out")),
            status(502, "bad gateway"),
        ]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 2, None);

        let err = client.get("http://registry/x", &[]).await.unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert_eq!(
            err.to_string(),
            "Request to http://registry/x failed with HTTP 502: bad gateway"
        );
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let transport = ScriptedTransport::new(vec![status(404, "not found"), status(200, "{}")]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 3, None);

        let err = client.get("http://registry/x", &[]).await.unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert!(matches!(err, RequestError::Status { status: 404, .. }));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_too_many_requests_honours_retry_after() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpResponse {
                status: 429,
                body: String::new(),
                retry_after: Some(Duration::from_secs(5)),
            }),
            status(200, "{}"),
        ]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 1, None);

        client.get("http://registry/x", &[]).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_long_retry_after_is_capped() {
        let too_many = || {
            Ok(HttpResponse {
                status: 429,
                body: String::new(),
                retry_after: Some(Duration::from_secs(86_400)),
            })
        };
        let transport =
            ScriptedTransport::new(vec![too_many(), too_many(), too_many(), status(200, "{}")]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 3, None);

        client.get("http://registry/x", &[]).await.unwrap();

        // Each wait is capped at timeout + retry_wait = 6s.
        assert_eq!(transport.calls(), 4);
        assert_eq!(clock.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let transport = ScriptedTransport::new(vec![status(500, "boom"), status(200, "{}")]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 0, None);

        assert!(client.get("http://registry/x", &[]).await.is_err());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_headers_and_query_are_sent() {
        let transport = ScriptedTransport::new(vec![status(200, "{}")]);
        let clock = ManualClock::new();
        let client = client(transport.clone(), &clock, 0, Some("Bearer abc"));

        let query = vec![("huisnummer".to_string(), "12".to_string())];
        client.get("http://registry/x", &query).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].query, query);
        assert!(requests[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer abc".to_string())));
        assert!(requests[0]
            .headers
            .contains(&("Accept".to_string(), "application/json".to_string())));
        assert_eq!(requests[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let transport = ScriptedTransport::new(vec![status(200, "<html>")]);
        let clock = ManualClock::new();
        let client = client(transport, &clock, 0, None);

        let err = client
            .get_json::<serde_json::Value>("http://registry/x", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Decode { .. }));
    }

    #[test]
    fn test_snippet_is_truncated() {
        let body = "x".repeat(1000);
        match classify("u", status(400, &body), Duration::ZERO, Duration::ZERO) {
            Attempt::Terminal(RequestError::Status { snippet, .. }) => {
                assert_eq!(snippet.len(), BODY_SNIPPET_CHARS)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
