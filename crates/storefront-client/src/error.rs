//! # Client Error Types
//!
//! Every failure the UI shell can observe from this crate.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Session      │  │   Transport     │  │     Server              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidToken   │  │  Network        │  │  Submission             │ │
//! │  │  ExpiredSession │  │  Timeout        │  │  MasterDataPartial-     │ │
//! │  │  NotAuthenticated│ │                 │  │    Failure              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Input       │  │    Storage      │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  Storage        │  │  InvalidConfig          │ │
//! │  │  Draft          │  │                 │  │  ConfigLoad/SaveFailed  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is fatal: every variant is caught at the flow boundary and
//! turned into an alert via [`ClientError::user_message`].

use storefront_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Alert text when the server rejects a request without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Client error type covering all session, network and submission failures.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Malformed or undecodable JWT; the session was not established.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The stored token's `exp` has passed; the session was cleared.
    #[error("Session expired, please sign in again")]
    ExpiredSession,

    /// No session is present.
    #[error("Not signed in")]
    NotAuthenticated,

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Required input missing or out of range; nothing was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Draft manipulation failed (unknown line, line limit).
    #[error("{0}")]
    Draft(CoreError),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never got a response (DNS, TLS, connection reset, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// Server reachable but the response was not a success.
    #[error("Request failed ({}): {message}", status_label(.status))]
    Submission { status: Option<u16>, message: String },

    /// At least one master-data category could not be loaded.
    #[error("Some data may be missing: {category} failed to load ({message})")]
    MasterDataPartialFailure { category: String, message: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Local key/value storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no status".to_string(),
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => ClientError::Validation(v),
            other => ClientError::Draft(other),
        }
    }
}

impl From<storefront_store::DbError> for ClientError {
    fn from(err: storefront_store::DbError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidConfig(format!("invalid URL: {}", err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Builds a [`ClientError::Submission`], falling back to the generic
    /// message when the server did not supply one.
    pub fn submission(status: Option<u16>, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        ClientError::Submission { status, message }
    }

    /// Returns true if the same request may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }

    /// Returns true for failures after validation passed: the request was
    /// attempted and did not succeed.
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Submission { .. } | ClientError::Network(_) | ClientError::Timeout(_)
        )
    }

    /// Returns true if the user has to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            ClientError::ExpiredSession | ClientError::NotAuthenticated | ClientError::InvalidToken(_)
        )
    }

    /// Alert text for the screen boundary.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::InvalidToken(_) => "Sign-in failed. Please try again.".to_string(),
            ClientError::ExpiredSession | ClientError::NotAuthenticated => {
                "Your session has ended. Please sign in again.".to_string()
            }
            ClientError::Validation(v) => v.to_string(),
            ClientError::Draft(e) => e.to_string(),
            ClientError::Network(_) | ClientError::Timeout(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Submission { message, .. } => message.clone(),
            ClientError::MasterDataPartialFailure { .. } => "Some data may be missing.".to_string(),
            ClientError::Storage(_) => "Could not access local storage.".to_string(),
            ClientError::InvalidConfig(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_) => "The app is misconfigured.".to_string(),
        }
    }
}
