//! Device preferences kept next to the session but outside it: the UI
//! language and the push-notification token. Signing out leaves both alone.

use std::sync::Arc;
use storefront_core::ValidationError;
use tracing::info;

use crate::error::{ClientError, ClientResult};
use crate::token_store::{StorageKey, TokenStore};

pub const DEFAULT_LANGUAGE: &str = "en";

pub struct Preferences {
    store: Arc<dyn TokenStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Preferences { store }
    }

    /// Stored language code, or [`DEFAULT_LANGUAGE`].
    pub async fn language(&self) -> String {
        self.store
            .get(StorageKey::Language)
            .await
            .filter(|code| is_language_code(code))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    /// Accepts codes like `en`, `ta` or `pt-BR`.
    pub async fn set_language(&self, code: &str) -> ClientResult<()> {
        let code = code.trim();
        if !is_language_code(code) {
            return Err(ClientError::Validation(ValidationError::InvalidFormat {
                field: "language".to_string(),
                reason: format!("'{}' is not a language code", code),
            }));
        }
        self.store.set(StorageKey::Language, code).await?;
        info!(language = %code, "Language changed");
        Ok(())
    }

    pub async fn push_token(&self) -> Option<String> {
        self.store.get(StorageKey::PushToken).await
    }

    pub async fn set_push_token(&self, token: &str) -> ClientResult<()> {
        if token.trim().is_empty() {
            return Err(ClientError::Validation(ValidationError::Required {
                field: "push token".to_string(),
            }));
        }
        self.store.set(StorageKey::PushToken, token.trim()).await
    }
}

fn is_language_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_lowercase()));
    primary_ok && parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    #[tokio::test]
    async fn test_language_defaults_and_validates() {
        let store = Arc::new(MemoryTokenStore::new());
        let prefs = Preferences::new(store.clone());
        assert_eq!(prefs.language().await, "en");

        prefs.set_language(" ta ").await.unwrap();
        assert_eq!(prefs.language().await, "ta");
        prefs.set_language("pt-BR").await.unwrap();
        assert_eq!(prefs.language().await, "pt-BR");

        assert!(prefs.set_language("").await.is_err());
        assert!(prefs.set_language("English").await.is_err());
        assert_eq!(prefs.language().await, "pt-BR");
    }

    #[tokio::test]
    async fn test_preferences_survive_sign_out() {
        let store = Arc::new(MemoryTokenStore::new());
        let prefs = Preferences::new(store.clone());
        prefs.set_push_token("ExponentPushToken[abc]").await.unwrap();
        prefs.set_language("hi").await.unwrap();

        store.clear_session().await.unwrap();
        assert_eq!(prefs.push_token().await.as_deref(), Some("ExponentPushToken[abc]"));
        assert_eq!(prefs.language().await, "hi");
        assert!(prefs.set_push_token("  ").await.is_err());
    }
}
