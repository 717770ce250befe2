//! # Repository Module
//!
//! Repository implementations for the local store.
//!
//! ## Repository Pattern
//! ```text
//! SessionManager / Preferences
//!      │
//!      │  db.kv().put_many(&[("access_token", ..), ("user_profile", ..)])
//!      ▼
//! KeyValueRepository
//! ├── get(&self, key)
//! ├── put(&self, key, value)
//! ├── put_many(&self, entries)     ← one transaction
//! └── delete_many(&self, keys)     ← one transaction
//!      │
//!      ▼
//! SQLite (kv_entries)
//! ```
//!
//! ## Available Repositories
//!
//! - [`kv::KeyValueRepository`] - String key/value entries

pub mod kv;
