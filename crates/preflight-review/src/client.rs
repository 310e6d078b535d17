//! Policy-review workflow HTTP client.

use std::time::Duration;

use preflight_models::PolicyResult;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ReviewError, ReviewResult};
use crate::types::{
    interpret_landing_page_reply, interpret_video_reply, LandingPageReviewReply, LandingPageReviewRequest,
    TriggerPayload, VideoReviewItem, VideoReviewReply, VideoReviewRequest,
};

/// Configuration for the review client.
#[derive(Debug, Clone)]
pub struct ReviewClientConfig {
    /// Upper bound for a blocking review call
    pub timeout: Duration,
    /// Upper bound for a hybrid trigger, including work after the soft timeout
    pub trigger_timeout: Duration,
    /// Max retries for requests that never reached the workflow
    pub max_retries: u32,
}

impl Default for ReviewClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            trigger_timeout: Duration::from_secs(300), // 5 minutes for video review
            max_retries: 1,
        }
    }
}

/// Client for the external policy-review workflow.
#[derive(Debug, Clone)]
pub struct ReviewClient {
    http: Client,
    config: ReviewClientConfig,
}

impl ReviewClient {
    /// Create a new review client.
    pub fn new(config: ReviewClientConfig) -> ReviewResult<Self> {
        let http = Client::builder().build().map_err(ReviewError::Network)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ReviewClientConfig {
        &self.config
    }

    /// Start a hybrid review.
    ///
    /// Returns the reply body (`Null` when empty or not JSON). Non-2xx
    /// statuses are errors. Never retried, since the workflow may already
    /// have started.
    pub async fn trigger(&self, url: &str, payload: &TriggerPayload) -> ReviewResult<serde_json::Value> {
        debug!(analysis_id = %payload.analysis_id, "Triggering policy review at {}", url);

        let response = self
            .http
            .post(url)
            .timeout(self.config.trigger_timeout)
            .json(payload)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    /// Run a blocking video review.
    pub async fn check_video(&self, url: &str, video_url: &str) -> ReviewResult<PolicyResult> {
        let request = VideoReviewRequest {
            creative_videos: vec![VideoReviewItem {
                video_preview_url: video_url.to_string(),
            }],
        };
        let reply: VideoReviewReply = self.post_json(url, &request).await?;
        Ok(interpret_video_reply(&reply))
    }

    /// Run a blocking landing page review.
    pub async fn check_landing_page(&self, url: &str, landing_page_url: &str) -> ReviewResult<PolicyResult> {
        let request = LandingPageReviewRequest {
            landing_pages: vec![landing_page_url.to_string()],
        };
        let reply: LandingPageReviewReply = self.post_json(url, &request).await?;
        Ok(interpret_landing_page_reply(&reply))
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> ReviewResult<T>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .with_retry(move || async move {
                let response = self
                    .http
                    .post(url)
                    .timeout(self.config.timeout)
                    .json(body)
                    .send()
                    .await
                    .map_err(ReviewError::Network)?;
                ensure_success(response).await
            })
            .await?;

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ReviewError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ReviewResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ReviewResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Review request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn ensure_success(response: Response) -> ReviewResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(ReviewError::ServiceUnavailable(body));
    }
    Err(ReviewError::request_failed(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_models::CampaignContext;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ReviewClient {
        ReviewClient::new(ReviewClientConfig {
            timeout: Duration::from_secs(5),
            trigger_timeout: Duration::from_secs(5),
            max_retries: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = ReviewClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.trigger_timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_trigger_returns_reply_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/video"))
            .and(body_partial_json(serde_json::json!({"analysis_id": "a-1", "industry": "games"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"analysis_id": "a-1", "status": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let context = CampaignContext::new("games", 15.0, 100.0, "US");
        let payload = TriggerPayload::new("a-1", "http://localhost/cb", &context);
        let reply = client()
            .trigger(&format!("{}/webhook/video", server.uri()), &payload)
            .await
            .unwrap();
        assert_eq!(reply["status"], "OK");
    }

    #[tokio::test]
    async fn test_trigger_non_json_reply_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
            .mount(&server)
            .await;

        let context = CampaignContext::new("games", 15.0, 100.0, "US");
        let payload = TriggerPayload::new("a-1", "http://localhost/cb", &context);
        let reply = client().trigger(&server.uri(), &payload).await.unwrap();
        assert!(reply.is_null());
    }

    #[tokio::test]
    async fn test_trigger_error_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let context = CampaignContext::new("games", 15.0, 100.0, "US");
        let payload = TriggerPayload::new("a-1", "http://localhost/cb", &context);
        let err = client().trigger(&server.uri(), &payload).await.unwrap_err();
        assert!(matches!(err, ReviewError::RequestFailed { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_check_video_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "creative_videos": [{"video_preview_url": "https://cdn/ad.mp4"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "creative_videos_review": [{"TextAnalysisResult": "Non-Compliant", "ViolationType": "Weapons"}]
            })))
            .mount(&server)
            .await;

        let result = client().check_video(&server.uri(), "https://cdn/ad.mp4").await.unwrap();
        assert!(!result.is_safe);
        assert_eq!(result.reason, "Weapons");
    }

    #[tokio::test]
    async fn test_check_landing_page_retries_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"landingPages": ["https://shop.example"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "landing_pages_review": [{"AnalysisResult": "Compliant"}]
            })))
            .mount(&server)
            .await;

        let result = client()
            .check_landing_page(&server.uri(), "https://shop.example")
            .await
            .unwrap();
        assert!(result.is_safe);
    }

    #[tokio::test]
    async fn test_check_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client().check_video(&server.uri(), "https://cdn/ad.mp4").await.unwrap_err();
        assert!(matches!(err, ReviewError::InvalidResponse(_)));
    }
}
