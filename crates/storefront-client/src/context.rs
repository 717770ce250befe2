//! # Client Context
//!
//! Builds every component once and hands out shared references, so screens
//! receive their collaborators explicitly instead of reaching for globals.
//!
//! ```text
//! ClientConfig ──► ReqwestTransport ──┐
//!              ──► Database ──► SqliteTokenStore ──┐
//!                                     │            │
//!                                     ▼            ▼
//!                               SessionManager ◄───┘
//!                                     │
//!      ┌──────────────┬───────────────┼───────────────┬──────────────┐
//!      ▼              ▼               ▼               ▼              ▼
//! MasterDataCache PriceQuoter OrderSubmissionFlow ReportsClient Preferences
//!                             ExpenseSubmissionFlow
//! ```

use std::sync::Arc;
use storefront_store::{Database, DbConfig};
use tracing::info;

use crate::api::{HttpTransport, ReqwestTransport};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::master_data::MasterDataCache;
use crate::notifier::{LogNotifier, Notifier, SilentNotifier};
use crate::preferences::Preferences;
use crate::quote::PriceQuoter;
use crate::reports::ReportsClient;
use crate::session::{SessionManager, SessionState};
use crate::submission::{ExpenseSubmissionFlow, OrderSubmissionFlow};
use crate::token_store::{SqliteTokenStore, TokenStore};

/// All engine components, wired together.
pub struct ClientContext {
    pub session: Arc<SessionManager>,
    pub master_data: Arc<MasterDataCache>,
    pub quoter: PriceQuoter,
    pub orders: OrderSubmissionFlow,
    pub expenses: ExpenseSubmissionFlow,
    pub reports: ReportsClient,
    pub preferences: Preferences,
    db: Option<Database>,
}

impl ClientContext {
    /// Opens the on-disk store and the HTTP transport described by `config`.
    pub async fn open(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let path = config.database_path();
        info!(path = %path.display(), "Opening local store");
        let db = Database::new(DbConfig::new(path)).await?;
        Self::with_database(config, db)
    }

    /// Same as [`ClientContext::open`] with an already opened database.
    pub fn with_database(config: &ClientConfig, db: Database) -> ClientResult<Self> {
        let http = Arc::new(ReqwestTransport::from_config(config)?);
        let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
            Arc::new(LogNotifier)
        } else {
            Arc::new(SilentNotifier)
        };
        let store = Arc::new(SqliteTokenStore::new(db.clone()));

        let mut context = Self::from_parts(store, http, notifier);
        context.db = Some(db);
        Ok(context)
    }

    /// Wires components over caller-supplied seams.
    pub fn from_parts(
        store: Arc<dyn TokenStore>,
        http: Arc<dyn HttpTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(store.clone(), http.clone()));
        let master_data = Arc::new(MasterDataCache::new(http.clone(), session.clone()));
        ClientContext {
            quoter: PriceQuoter::new(http.clone(), session.clone()),
            orders: OrderSubmissionFlow::new(
                session.clone(),
                master_data.clone(),
                http.clone(),
                notifier.clone(),
            ),
            expenses: ExpenseSubmissionFlow::new(session.clone(), http.clone(), notifier),
            reports: ReportsClient::new(http, session.clone()),
            preferences: Preferences::new(store),
            master_data,
            session,
            db: None,
        }
    }

    /// Settles the session from storage. Call once at start-up.
    pub async fn start(&self) -> SessionState {
        self.session.check_session().await
    }

    /// Ends the session and forgets session-scoped master data.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let result = self.session.logout().await;
        self.master_data.clear().await;
        result
    }

    /// Closes the local store, if this context opened one.
    pub async fn close(self) {
        if let Some(db) = self.db {
            db.close().await;
        }
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{alice_token, FakeTransport};
    use crate::token_store::StorageKey;
    use serde_json::json;

    #[tokio::test]
    async fn test_context_over_sqlite_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let context = ClientContext::with_database(&ClientConfig::default(), db).unwrap();

        assert_eq!(context.start().await, SessionState::Unauthenticated);
        context.preferences.set_language("ta").await.unwrap();
        assert_eq!(context.preferences.language().await, "ta");
        context.close().await;
    }

    #[tokio::test]
    async fn test_sign_out_clears_master_data() {
        let http = FakeTransport::new();
        http.respond_ok("/products", json!([{"id": 1, "name": "Kulfi", "unitPrice": 20}]));
        let store = Arc::new(crate::token_store::MemoryTokenStore::new());
        let context = ClientContext::from_parts(store.clone(), http.clone(), Arc::new(SilentNotifier));

        context.session.login(&alice_token(), None, None).await.unwrap();
        context.master_data.load().await.unwrap();
        assert!(!context.master_data.snapshot().await.products.is_empty());

        context.sign_out().await.unwrap();
        assert!(context.master_data.snapshot().await.is_empty());
        assert_eq!(store.get(StorageKey::AccessToken).await, None);
    }
}
