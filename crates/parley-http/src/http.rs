//! HTTP backend abstraction.
//!
//! Adapters depend on the [`HttpBackend`] trait rather than on reqwest
//! directly, so request building and response parsing can be exercised with
//! a fake backend. The production implementation is [`ReqwestBackend`].
//!
//! Requests are not retried: a failed turn simply ends.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{HttpError, HttpResult};

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that POST JSON and return the raw response body.
///
/// Implementations must abort the request when the returned future is
/// dropped.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// POST `body` as JSON to `url` and return the body of a 2xx response.
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> HttpResult<Vec<u8>>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    /// Create a backend with a per-request timeout and optional bearer token.
    pub fn new(timeout: Duration, auth_token: Option<String>) -> HttpResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, auth_token })
    }

    fn build_request(&self, url: &Url, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let mut request = self.client.post(url.as_str()).json(body);
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> HttpResult<Vec<u8>> {
        let response = self.build_request(url, body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reqwest_backend_creation() {
        let backend = ReqwestBackend::new(Duration::from_secs(30), None).unwrap();
        assert!(backend.auth_token.is_none());

        let backend =
            ReqwestBackend::new(Duration::from_secs(30), Some("sk-test".to_string())).unwrap();
        assert_eq!(backend.auth_token.as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn test_fake_backend_replays_in_order() {
        let backend = FakeBackend::new(vec![
            CannedResponse::Status(500),
            CannedResponse::json(&json!({"ok": true})),
        ]);
        let url = Url::parse("http://localhost/api").unwrap();

        let first = backend.post_json(&url, &json!({"n": 1})).await;
        assert!(matches!(first, Err(HttpError::Status { status: 500, .. })));

        let second = backend.post_json(&url, &json!({"n": 2})).await.unwrap();
        assert_eq!(second, br#"{"ok":true}"#.to_vec());

        // The last response repeats.
        assert!(backend.post_json(&url, &json!({"n": 3})).await.is_ok());
        assert_eq!(backend.requests().len(), 3);
        assert_eq!(backend.requests()[1].1["n"], 2);
    }
}
