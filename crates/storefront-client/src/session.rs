//! # Session Manager
//!
//! Owns the session lifecycle and is the only writer of session entries in
//! the [`TokenStore`].
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  check_session   ┌───────────────┐                        │
//! │   │ Unknown │─────────────────►│ Authenticated │◄──── login / sign_in   │
//! │   └────┬────┘  (valid token)   └───────┬───────┘                        │
//! │        │                               │ logout                          │
//! │        │ check_session                 │ check_session (expired)         │
//! │        │ (missing/invalid/expired)     │ access_token (expired)          │
//! │        │                               ▼                                 │
//! │        │                       ┌─────────────────┐                       │
//! │        └──────────────────────►│ Unauthenticated │                       │
//! │                 logout         └─────────────────┘                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! Every transition holds one async mutex across the storage write and the
//! state update. Racing `login`/`logout`/`check_session` calls are therefore
//! applied one at a time, and the published state always matches what was
//! last persisted.
//!
//! Watchers (UI shell) observe transitions through [`SessionManager::subscribe`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use storefront_core::validation::validate_credentials;
use storefront_core::UserProfile;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::api::{decode_envelope, Envelope, HttpTransport};
use crate::error::{ClientError, ClientResult};
use crate::jwt::{decode_claims, TokenClaims};
use crate::token_store::{parse_profile, StorageKey, TokenStore};

// =============================================================================
// Session State
// =============================================================================

/// An established session, as decoded from the access token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile: UserProfile,
    /// `exp` claim; `None` if the token carried none.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Valid iff the token has an expiry that is still in the future.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp > now)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Storage has not been checked yet.
    #[default]
    Unknown,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// This state as seen at `now`: an authenticated session whose token
    /// has expired reads as `Unauthenticated`.
    pub fn at(&self, now: DateTime<Utc>) -> SessionState {
        match self {
            SessionState::Authenticated(session) if !session.is_valid_at(now) => {
                SessionState::Unauthenticated
            }
            other => other.clone(),
        }
    }
}

/// `data` of a successful `/auth/login` response.
#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "accessToken", alias = "token")]
    access_token: String,
    #[serde(default, rename = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

// =============================================================================
// Session Manager
// =============================================================================

pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    http: Arc<dyn HttpTransport>,
    state: watch::Sender<SessionState>,
    /// Serialises transitions.
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>, http: Arc<dyn HttpTransport>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        SessionManager {
            store,
            http,
            state,
            transition: Mutex::new(()),
        }
    }

    /// Current state snapshot.
    ///
    /// An expired token reads as `Unauthenticated` straight away; storage
    /// is cleared by the next `check_session` or `access_token`.
    pub fn state(&self) -> SessionState {
        self.state.borrow().at(Utc::now())
    }

    /// Receiver that wakes on every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state().session().map(|s| s.profile.clone())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Reads the stored token and settles the state.
    ///
    /// A missing, undecodable, exp-less or expired token clears all session
    /// entries and yields `Unauthenticated`.
    pub async fn check_session(&self) -> SessionState {
        let _guard = self.transition.lock().await;

        let restored = match self.store.get(StorageKey::AccessToken).await {
            Some(token) => self.restore(&token).await,
            None => {
                debug!("No stored session");
                None
            }
        };

        let next = match restored {
            Some(session) => {
                info!(user = %session.profile.name, "Session restored");
                SessionState::Authenticated(session)
            }
            None => {
                if let Err(e) = self.store.clear_session().await {
                    error!(error = %e, "Failed to clear stale session");
                }
                SessionState::Unauthenticated
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    async fn restore(&self, token: &str) -> Option<Session> {
        let claims = match decode_claims(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Stored token is unreadable");
                return None;
            }
        };

        let expires_at = claims.expires_at();
        match expires_at {
            Some(exp) if exp > Utc::now() => {}
            Some(exp) => {
                info!(expired_at = %exp, "Stored session has expired");
                return None;
            }
            None => {
                warn!("Stored token has no expiry");
                return None;
            }
        }

        let stored = match self.store.get(StorageKey::UserProfile).await {
            Some(raw) => parse_profile(&raw),
            None => None,
        };
        let profile = profile_from_claims(&claims, stored.as_ref())?;

        Some(Session {
            profile,
            expires_at,
        })
    }

    /// Establishes a session from tokens the server issued.
    ///
    /// The payload is decoded before anything is written: an undecodable
    /// token fails with `InvalidToken` and leaves storage untouched. If the
    /// store write fails, the state does not change.
    pub async fn login(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        user_data: Option<&Value>,
    ) -> ClientResult<Session> {
        let claims = decode_claims(access_token)?;
        if claims.sub.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(ClientError::InvalidToken("token has no subject".into()));
        }

        let user = user_data.and_then(profile_from_user_data);
        let profile = profile_from_claims(&claims, user.as_ref())
            .ok_or_else(|| ClientError::InvalidToken("token has no subject".into()))?;

        let _guard = self.transition.lock().await;
        self.store
            .set_session(access_token, refresh_token, &profile)
            .await?;

        let session = Session {
            profile,
            expires_at: claims.expires_at(),
        };
        if !session.is_valid_at(Utc::now()) {
            warn!(user = %session.profile.name, "Signed in with a token that is already expired");
        }
        info!(
            user = %session.profile.name,
            roles = session.profile.roles.len(),
            "Signed in"
        );
        self.state
            .send_replace(SessionState::Authenticated(session.clone()));
        Ok(session)
    }

    /// Exchanges credentials for tokens via `POST /auth/login`.
    pub async fn sign_in(&self, username: &str, password: &str) -> ClientResult<Session> {
        validate_credentials(username, password)?;

        let body = json!({ "username": username.trim(), "password": password });
        let response = self.http.post("/auth/login", None, &body).await?;

        if !(200..300).contains(&response.status) {
            warn!(status = response.status, "Sign-in rejected");
            return Err(response.into_failure());
        }

        match decode_envelope::<LoginData>(&response.body) {
            Envelope::Success(data) => {
                self.login(
                    &data.access_token,
                    data.refresh_token.as_deref(),
                    data.user.as_ref(),
                )
                .await
            }
            Envelope::Failure { message } => {
                warn!(status = response.status, "Sign-in rejected");
                Err(ClientError::submission(Some(response.status), message))
            }
        }
    }

    /// Clears the session. Safe from any state.
    ///
    /// The state becomes `Unauthenticated` even if clearing storage failed;
    /// that failure is still returned.
    pub async fn logout(&self) -> ClientResult<()> {
        let _guard = self.transition.lock().await;
        let cleared = self.store.clear_session().await;
        self.state.send_replace(SessionState::Unauthenticated);
        info!("Signed out");
        cleared
    }

    /// Bearer token for an authenticated request.
    ///
    /// An expired session is cleared here and reported as `ExpiredSession`.
    pub async fn access_token(&self) -> ClientResult<String> {
        let _guard = self.transition.lock().await;

        let session = match self.state.borrow().session() {
            Some(session) => session.clone(),
            None => return Err(ClientError::NotAuthenticated),
        };

        if !session.is_valid_at(Utc::now()) {
            warn!(user = %session.profile.name, "Session expired");
            if let Err(e) = self.store.clear_session().await {
                error!(error = %e, "Failed to clear expired session");
            }
            self.state.send_replace(SessionState::Unauthenticated);
            return Err(ClientError::ExpiredSession);
        }

        self.store
            .get(StorageKey::AccessToken)
            .await
            .ok_or(ClientError::NotAuthenticated)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Profile Extraction
// =============================================================================

/// Builds the profile from token claims. `fallback` only fills the name and
/// user id when the claims lack them. Returns `None` if no name is known.
fn profile_from_claims(claims: &TokenClaims, fallback: Option<&UserProfile>) -> Option<UserProfile> {
    let name = claims
        .name
        .clone()
        .or_else(|| claims.sub.clone())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| fallback.map(|p| p.name.clone()))
        .filter(|n| !n.trim().is_empty())?;

    Some(UserProfile {
        name,
        roles: claims.roles.iter().cloned().collect::<BTreeSet<_>>(),
        user_id: claims.user_id.or_else(|| fallback.and_then(|p| p.user_id)),
    })
}

/// Reads `{name, userId|id}` from the raw user object the server may send
/// alongside the tokens.
fn profile_from_user_data(user: &Value) -> Option<UserProfile> {
    let name = user
        .get("name")
        .or_else(|| user.get("username"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let user_id = ["userId", "id"].iter().find_map(|key| match user.get(*key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    Some(UserProfile {
        name,
        roles: BTreeSet::new(),
        user_id,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
