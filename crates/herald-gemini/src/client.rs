// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Provides [`GeminiClient`], the single retry/rotate wrapper every
//! upstream call in Herald goes through: per-attempt timeouts,
//! recoverable-vs-fatal status classification, and credential rotation
//! across the pool on recoverable failures.

use std::sync::Arc;
use std::time::Duration;

use herald_config::model::GeminiConfig;
use herald_core::HeraldError;
use tracing::{debug, warn};

use crate::pool::CredentialPool;
use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// Base URL for the Gemini API model collection.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for Gemini API communication with bounded retry.
///
/// Attempts are capped at `min(pool size, attempt_cap)`. Each attempt
/// uses the pool's current credential; recoverable failures rotate the
/// cursor before the next attempt, fatal failures abort immediately.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    pool: Arc<CredentialPool>,
    model: String,
    attempt_cap: u32,
    attempt_timeout: Duration,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new Gemini client over the given credential pool.
    pub fn new(pool: Arc<CredentialPool>, config: &GeminiConfig) -> Result<Self, HeraldError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| HeraldError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            pool,
            model: config.model.clone(),
            attempt_cap: config.attempt_cap,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// The credential pool this client rotates over.
    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Issues one `generateContent` call with rotation and bounded retry.
    ///
    /// Classification per attempt:
    /// - transport timeout or connection failure: rotate and retry
    /// - 408/429/500/502/503/529 and 401/403 (credential rejected):
    ///   rotate and retry
    /// - other non-2xx: fatal, abort with no further attempts
    /// - 2xx with an unparseable body: fatal (malformed response)
    ///
    /// Exhausting all attempts returns [`HeraldError::Exhausted`].
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, HeraldError> {
        let max_attempts = self.attempt_cap.min(self.pool.len() as u32).max(1);

        for attempt in 0..max_attempts {
            if attempt > 0 {
                debug!(attempt, "retrying upstream call with rotated credential");
            }

            let key = self.pool.current().to_string();
            let url = format!("{}/{}:generateContent", self.base_url, self.model);

            let result = self
                .http
                .post(&url)
                .query(&[("key", key.as_str())])
                .json(request)
                .timeout(self.attempt_timeout)
                .send()
                .await;

            let response = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, error = %e, "upstream transport failure, rotating credential");
                    self.pool.rotate();
                    continue;
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, "upstream response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| HeraldError::Upstream {
                    message: format!("failed to read upstream response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| HeraldError::UpstreamFatal {
                    message: format!("unparseable upstream response: {e}"),
                });
            }

            if is_recoverable_status(status) {
                warn!(status = %status, attempt, "recoverable upstream status, rotating credential");
                self.pool.rotate();
                continue;
            }

            // Fatal status: no rotation, no further attempts.
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "upstream returned {status} ({}): {}",
                    api_err.error.status, api_err.error.message
                ),
                Err(_) => format!("upstream returned {status}"),
            };
            return Err(HeraldError::UpstreamFatal { message });
        }

        Err(HeraldError::Exhausted {
            attempts: max_attempts,
        })
    }

    /// [`generate`](Self::generate) plus extraction of the reply text.
    ///
    /// A response without candidate text is treated the same as an
    /// unparseable one.
    pub async fn generate_text(&self, request: &GenerateRequest) -> Result<String, HeraldError> {
        let response = self.generate(request).await?;
        response
            .primary_text()
            .map(str::to_owned)
            .ok_or_else(|| HeraldError::UpstreamFatal {
                message: "upstream response contains no candidate text".into(),
            })
    }
}

/// True for statuses worth a rotate-and-retry.
///
/// 401/403 are included: the credential was rejected, not the request,
/// and the next pool entry may still be valid.
fn is_recoverable_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 401 | 403 | 408 | 429 | 500 | 502 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, keys: &[&str], attempt_cap: u32) -> GeminiClient {
        let pool = Arc::new(
            CredentialPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap(),
        );
        let config = GeminiConfig {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            model: "gemini-2.5-flash".into(),
            max_output_tokens: 1024,
            attempt_cap,
            attempt_timeout_secs: 2,
        };
        GeminiClient::new(pool, &config)
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> GenerateRequest {
        GenerateRequest::new(vec![Content::user_text("Hello")], 1024)
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Hi there!"}], "role": "model"}}
            ]
        })
    }

    fn rate_limit_body() -> serde_json::Value {
        serde_json::json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        })
    }

    const MODEL_PATH: &str = "/gemini-2.5-flash:generateContent";

    #[tokio::test]
    async fn generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1"], 4);
        let text = client.generate_text(&test_request()).await.unwrap();
        assert_eq!(text, "Hi there!");
    }

    #[tokio::test]
    async fn rate_limit_rotates_to_next_credential() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "k2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1", "k2"], 4);
        let text = client.generate_text(&test_request()).await.unwrap();
        assert_eq!(text, "Hi there!");
    }

    #[tokio::test]
    async fn each_credential_used_once_before_exhaustion() {
        let server = MockServer::start().await;

        for key in ["k1", "k2", "k3"] {
            Mock::given(method("POST"))
                .and(path(MODEL_PATH))
                .and(query_param("key", key))
                .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body()))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = test_client(&server.uri(), &["k1", "k2", "k3"], 4);
        let err = client.generate(&test_request()).await.unwrap_err();
        match err {
            HeraldError::Exhausted { attempts } => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fatal_status_never_rotates_or_retries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "Bad request", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1", "k2", "k3"], 4);
        let err = client.generate(&test_request()).await.unwrap_err();
        match err {
            HeraldError::UpstreamFatal { message } => {
                assert!(message.contains("INVALID_ARGUMENT"), "got: {message}");
            }
            other => panic!("expected UpstreamFatal, got {other:?}"),
        }
        // The cursor must not have moved off the first credential.
        assert_eq!(client.pool().current(), "k1");
    }

    #[tokio::test]
    async fn credential_rejection_is_recoverable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "expired"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "API key expired", "status": "PERMISSION_DENIED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["expired", "fresh"], 4);
        assert!(client.generate(&test_request()).await.is_ok());
    }

    #[tokio::test]
    async fn attempt_timeout_rotates_credential() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body())
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "fast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["slow", "fast"], 4);
        assert!(client.generate(&test_request()).await.is_ok());
    }

    #[tokio::test]
    async fn unparseable_success_body_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1", "k2"], 4);
        let err = client.generate(&test_request()).await.unwrap_err();
        assert!(matches!(err, HeraldError::UpstreamFatal { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_candidates_is_fatal_for_text_extraction() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1"], 4);
        let err = client.generate_text(&test_request()).await.unwrap_err();
        assert!(matches!(err, HeraldError::UpstreamFatal { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn attempt_cap_bounds_a_large_pool() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "Overloaded", "status": "UNAVAILABLE"}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), &["k1", "k2", "k3", "k4", "k5"], 2);
        let err = client.generate(&test_request()).await.unwrap_err();
        match err {
            HeraldError::Exhausted { attempts } => assert_eq!(attempts, 2),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }
}
