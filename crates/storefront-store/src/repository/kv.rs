//! # Key/Value Repository
//!
//! String entries keyed by a fixed name ("access_token", "language", ...).
//!
//! ## Atomic Groups
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login:  put access_token + refresh_token + user_profile               │
//! │  logout: delete access_token + refresh_token + user_profile            │
//! │                                                                         │
//! │  ┌─────────────────── SINGLE TRANSACTION ──────────────────────────┐   │
//! │  │  INSERT ... ON CONFLICT(key) DO UPDATE   (each put)             │   │
//! │  │  DELETE FROM kv_entries WHERE key = ?    (each delete)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │  COMMIT ← the session is either fully written or not at all           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};

const UPSERT_SQL: &str = r#"
    INSERT INTO kv_entries (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

const DELETE_SQL: &str = "DELETE FROM kv_entries WHERE key = ?1";

/// Repository for key/value entries.
#[derive(Debug, Clone)]
pub struct KeyValueRepository {
    pool: SqlitePool,
}

impl KeyValueRepository {
    /// Creates a new KeyValueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KeyValueRepository { pool }
    }

    /// Reads one entry. `Ok(None)` when absent.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Writes one entry, replacing any previous value.
    pub async fn put(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, "Writing entry");
        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Writes several entries in one transaction.
    pub async fn put_many(&self, entries: &[(&str, &str)]) -> DbResult<()> {
        self.apply(entries, &[]).await
    }

    /// Deletes several entries in one transaction. Missing keys are fine.
    pub async fn delete_many(&self, keys: &[&str]) -> DbResult<()> {
        self.apply(&[], keys).await
    }

    /// Writes `puts` and deletes `deletes` in one transaction.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // New session without a refresh token: drop the stale one
    /// kv.apply(&[("access_token", token)], &["refresh_token"]).await?;
    /// ```
    pub async fn apply(&self, puts: &[(&str, &str)], deletes: &[&str]) -> DbResult<()> {
        debug!(puts = puts.len(), deletes = deletes.len(), "Applying entry batch");

        let mut tx = self.begin().await?;
        let now = Utc::now().to_rfc3339();

        for (key, value) in puts {
            sqlx::query(UPSERT_SQL)
                .bind(*key)
                .bind(*value)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }
        for key in deletes {
            sqlx::query(DELETE_SQL).bind(*key).execute(&mut *tx).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
