//! # HTTP Transport
//!
//! The single seam through which this crate talks to the REST API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionManager / MasterDataCache / SubmissionFlow                      │
//! │       │  http.post("/orders", Some(token), &payload)                    │
//! │       ▼                                                                 │
//! │  HttpTransport (trait)                                                  │
//! │       │                                                                 │
//! │       ├── ReqwestTransport (production)                                 │
//! │       │     Authorization: Bearer <token>                               │
//! │       │     Content-Type: application/json                              │
//! │       │     deadline = request_timeout_secs                             │
//! │       │                                                                 │
//! │       └── in-test fakes (record requests, return canned bodies)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiResponse { status: 201, body: {"status":"success","data":...} }     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  decode_envelope::<T>() → Envelope::Success(T) | Envelope::Failure      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport failures (no response at all) come back as
//! `ClientError::Network`/`ClientError::Timeout`. Any HTTP status, including
//! 4xx/5xx, is an `Ok(ApiResponse)`; callers decide what success means.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Value of the envelope's `status` field on success.
pub const SUCCESS_STATUS: &str = "success";

// =============================================================================
// Response
// =============================================================================

/// Raw response: HTTP status plus the JSON body (`Null` if empty/not JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        ApiResponse { status, body }
    }

    /// True when the body's `status` field is `"success"`.
    pub fn is_success_envelope(&self) -> bool {
        self.body.get("status").and_then(Value::as_str) == Some(SUCCESS_STATUS)
    }

    /// The server-supplied `message`, if any.
    pub fn message(&self) -> Option<String> {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Converts a non-success into [`ClientError::Submission`].
    pub fn into_failure(self) -> ClientError {
        ClientError::submission(Some(self.status), self.message())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Decoded `{status, data, message}` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure { message: Option<String> },
}

/// Decodes the envelope explicitly instead of trusting field presence.
///
/// `Success` requires `status == "success"` AND a `data` field that
/// deserializes into `T`. Everything else is a `Failure`, carrying the
/// server's `message` when there is one.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use storefront_client::api::{decode_envelope, Envelope};
///
/// let ok: Envelope<Vec<i64>> = decode_envelope(&json!({"status": "success", "data": [1, 2]}));
/// assert_eq!(ok, Envelope::Success(vec![1, 2]));
///
/// let err: Envelope<Vec<i64>> = decode_envelope(&json!({"status": "error", "message": "boom"}));
/// assert_eq!(err, Envelope::Failure { message: Some("boom".into()) });
/// ```
pub fn decode_envelope<T: DeserializeOwned>(body: &Value) -> Envelope<T> {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    if body.get("status").and_then(Value::as_str) != Some(SUCCESS_STATUS) {
        return Envelope::Failure { message };
    }

    match body.get("data").map(|data| T::deserialize(data)) {
        Some(Ok(data)) => Envelope::Success(data),
        Some(Err(e)) => {
            debug!(error = %e, "Envelope data has an unexpected shape");
            Envelope::Failure {
                message: message.or_else(|| Some("Unexpected response from server".to_string())),
            }
        }
        None => Envelope::Failure {
            message: message.or_else(|| Some("Response is missing data".to_string())),
        },
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// HTTP seam, injected into every component that talks to the API.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `GET {base}{path}?{query}`.
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        bearer: Option<&str>,
    ) -> ClientResult<ApiResponse>;

    /// `POST {base}{path}` with a JSON body.
    async fn post(&self, path: &str, bearer: Option<&str>, body: &Value) -> ClientResult<ApiResponse>;
}

// =============================================================================
// Reqwest Transport
// =============================================================================

/// Production transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with a per-request deadline.
    pub fn new(base_url: Url, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(ReqwestTransport {
            http,
            base_url,
            timeout,
        })
    }

    /// Creates a transport from the resolved configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL, keeping any base path (`/api`).
    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    async fn send(&self, request: RequestBuilder, bearer: Option<&str>) -> ClientResult<ApiResponse> {
        let request = match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        debug!(status, "Response received");
        Ok(ApiResponse { status, body })
    }

    fn map_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_secs())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        bearer: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        let url = self.endpoint(path)?;
        debug!(path = %path, "GET");
        self.send(self.http.get(url).query(query), bearer).await
    }

    async fn post(&self, path: &str, bearer: Option<&str>, body: &Value) -> ClientResult<ApiResponse> {
        let url = self.endpoint(path)?;
        debug!(path = %path, "POST");
        self.send(self.http.post(url).json(body), bearer).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let body = json!({"status": "success", "data": {"amount": 56.0}});
        let decoded: Envelope<Value> = decode_envelope(&body);
        assert_eq!(decoded, Envelope::Success(json!({"amount": 56.0})));
    }

    #[test]
    fn test_envelope_failure_shapes() {
        // Wrong status, message passed through
        let decoded: Envelope<Vec<Value>> =
            decode_envelope(&json!({"status": "error", "message": "Unauthorized"}));
        assert_eq!(
            decoded,
            Envelope::Failure {
                message: Some("Unauthorized".into())
            }
        );

        // Missing status entirely
        let decoded: Envelope<Vec<Value>> = decode_envelope(&json!({"data": []}));
        assert_eq!(decoded, Envelope::Failure { message: None });

        // Success without a data array
        let decoded: Envelope<Vec<Value>> =
            decode_envelope(&json!({"status": "success", "data": {"not": "a list"}}));
        assert!(matches!(decoded, Envelope::Failure { message: Some(_) }));

        // Not even an object
        let decoded: Envelope<Vec<Value>> = decode_envelope(&Value::Null);
        assert_eq!(decoded, Envelope::Failure { message: None });
    }

    #[test]
    fn test_api_response_helpers() {
        let response = ApiResponse::new(400, json!({"status": "error", "message": "Bad quantity"}));
        assert!(!response.is_success_envelope());
        match response.into_failure() {
            ClientError::Submission { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "Bad quantity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let transport = ReqwestTransport::new(
            Url::parse("https://pos.example.com/api/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            transport.endpoint("/orders").unwrap().as_str(),
            "https://pos.example.com/api/orders"
        );
        assert_eq!(
            transport.endpoint("sales/calculateAmount").unwrap().as_str(),
            "https://pos.example.com/api/sales/calculateAmount"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let transport = ReqwestTransport::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = transport.get("/products", &[], None).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
