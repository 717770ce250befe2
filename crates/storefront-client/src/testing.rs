//! Shared fakes for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api::{ApiResponse, HttpTransport};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;
use crate::token_store::MemoryTokenStore;

/// One request as seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(ApiResponse),
    NetworkDown(String),
    TimedOut,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Transport that answers from a per-path table and records every call.
/// Unknown paths answer 404 with an empty body.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    hooks: Mutex<HashMap<String, Hook>>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport")
            .field("requests", &self.requests.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Respond(ApiResponse::new(status, body)));
    }

    /// Shorthand for `200 {"status":"success","data":data}`.
    pub fn respond_ok(&self, path: &str, data: Value) {
        self.respond(path, 200, json!({"status": "success", "data": data}));
    }

    pub fn fail_network(&self, path: &str, reason: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::NetworkDown(reason.to_string()));
    }

    pub fn time_out(&self, path: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::TimedOut);
    }

    /// Runs `hook` while a request to `path` is in flight, before it is
    /// answered.
    pub fn during(&self, path: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::new(hook));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn answer(&self, request: RecordedRequest) -> ClientResult<ApiResponse> {
        let reply = self.replies.lock().unwrap().get(&request.path).cloned();
        let hook = self.hooks.lock().unwrap().get(&request.path).cloned();
        self.requests.lock().unwrap().push(request);
        if let Some(hook) = hook {
            hook();
        }
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::NetworkDown(reason)) => Err(ClientError::Network(reason)),
            Some(Reply::TimedOut) => Err(ClientError::Timeout(15)),
            None => Ok(ApiResponse::new(404, Value::Null)),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        bearer: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        self.answer(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            query: query.to_vec(),
            bearer: bearer.map(str::to_string),
            body: None,
        })
    }

    async fn post(&self, path: &str, bearer: Option<&str>, body: &Value) -> ClientResult<ApiResponse> {
        self.answer(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            query: Vec::new(),
            bearer: bearer.map(str::to_string),
            body: Some(body.clone()),
        })
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Signs `claims` as an HS256 JWT.
pub fn mint_token(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"storefront-test-secret"),
    )
    .unwrap()
}

pub fn future_exp() -> i64 {
    Utc::now().timestamp() + 3600
}

pub fn past_exp() -> i64 {
    Utc::now().timestamp() - 3600
}

/// A valid token for `alice` with the admin role.
pub fn alice_token() -> String {
    mint_token(&json!({
        "sub": "alice",
        "roles": ["ROLE_ADMIN"],
        "userId": 7,
        "exp": future_exp(),
    }))
}

/// Session manager over an in-memory store, already signed in as `alice`.
pub async fn signed_in(http: Arc<FakeTransport>) -> Arc<SessionManager> {
    let session = Arc::new(SessionManager::new(Arc::new(MemoryTokenStore::new()), http));
    session
        .login(&alice_token(), Some("refresh"), None)
        .await
        .unwrap();
    session
}
