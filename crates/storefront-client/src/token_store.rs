//! # Token Store
//!
//! Persistent key/value storage for the session and user preferences.
//!
//! ## Stored Entries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key             │ written by              │ cleared by clear_session  │
//! │  ────────────────┼─────────────────────────┼─────────────────────────  │
//! │  access_token    │ set_session             │ ✓                         │
//! │  refresh_token   │ set_session             │ ✓                         │
//! │  user_profile    │ set_session (JSON)      │ ✓                         │
//! │  push_token      │ Preferences             │ ✗                         │
//! │  language        │ Preferences             │ ✗                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//! - `get` never fails: an unavailable store reads as "absent"
//! - `set_session` writes the three session entries atomically
//! - `clear_session` removes them in one call and is idempotent
//!
//! Only [`crate::session::SessionManager`] writes session entries.

use async_trait::async_trait;
use std::collections::HashMap;
use storefront_core::UserProfile;
use storefront_store::Database;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Keys
// =============================================================================

/// Every key this client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    UserProfile,
    PushToken,
    Language,
}

impl StorageKey {
    /// The three entries that make up a session.
    pub const SESSION: [StorageKey; 3] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::UserProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::UserProfile => "user_profile",
            StorageKey::PushToken => "push_token",
            StorageKey::Language => "language",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Trait
// =============================================================================

/// Persistent key/value storage seam.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Reads one entry. Returns `None` when absent OR when storage failed.
    async fn get(&self, key: StorageKey) -> Option<String>;

    /// Writes one non-session entry (preferences).
    async fn set(&self, key: StorageKey, value: &str) -> ClientResult<()>;

    /// Writes all session entries at once. A missing refresh token removes
    /// any stale one.
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &UserProfile,
    ) -> ClientResult<()>;

    /// Removes all session entries. Safe to call when nothing is stored.
    async fn clear_session(&self) -> ClientResult<()>;
}

fn profile_json(profile: &UserProfile) -> ClientResult<String> {
    serde_json::to_string(profile).map_err(|e| ClientError::Storage(e.to_string()))
}

/// Parses a stored profile; a corrupt entry reads as absent.
pub fn parse_profile(raw: &str) -> Option<UserProfile> {
    serde_json::from_str(raw)
        .map_err(|e| debug!(error = %e, "Stored profile is unreadable"))
        .ok()
}

// =============================================================================
// SQLite Backend
// =============================================================================

/// [`TokenStore`] backed by the local SQLite key/value table.
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    db: Database,
}

impl SqliteTokenStore {
    pub fn new(db: Database) -> Self {
        SqliteTokenStore { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn get(&self, key: StorageKey) -> Option<String> {
        match self.db.kv().get(key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                error!(key = %key, error = %e, "Token store read failed");
                None
            }
        }
    }

    async fn set(&self, key: StorageKey, value: &str) -> ClientResult<()> {
        self.db.kv().put(key.as_str(), value).await.map_err(|e| {
            error!(key = %key, error = %e, "Token store write failed");
            ClientError::from(e)
        })
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &UserProfile,
    ) -> ClientResult<()> {
        let profile = profile_json(profile)?;

        let mut puts = vec![
            (StorageKey::AccessToken.as_str(), access_token),
            (StorageKey::UserProfile.as_str(), profile.as_str()),
        ];
        let mut deletes = Vec::new();
        match refresh_token {
            Some(token) => puts.push((StorageKey::RefreshToken.as_str(), token)),
            None => deletes.push(StorageKey::RefreshToken.as_str()),
        }

        self.db.kv().apply(&puts, &deletes).await.map_err(|e| {
            error!(error = %e, "Failed to persist session");
            ClientError::from(e)
        })
    }

    async fn clear_session(&self) -> ClientResult<()> {
        let keys = StorageKey::SESSION.map(|k| k.as_str());
        self.db.kv().delete_many(&keys).await.map_err(|e| {
            error!(error = %e, "Failed to clear session");
            ClientError::from(e)
        })
    }
}

// =============================================================================
// In-Memory Backend
// =============================================================================

/// [`TokenStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: StorageKey) -> Option<String> {
        self.entries.read().await.get(&key).cloned()
    }

    async fn set(&self, key: StorageKey, value: &str) -> ClientResult<()> {
        self.entries.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        profile: &UserProfile,
    ) -> ClientResult<()> {
        let profile = profile_json(profile)?;

        // One write guard: readers never see a half-written session
        let mut entries = self.entries.write().await;
        entries.insert(StorageKey::AccessToken, access_token.to_string());
        entries.insert(StorageKey::UserProfile, profile);
        match refresh_token {
            Some(token) => entries.insert(StorageKey::RefreshToken, token.to_string()),
            None => entries.remove(&StorageKey::RefreshToken),
        };
        Ok(())
    }

    async fn clear_session(&self) -> ClientResult<()> {
        let mut entries = self.entries.write().await;
        for key in StorageKey::SESSION {
            entries.remove(&key);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
