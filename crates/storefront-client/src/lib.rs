//! # storefront-client: Session & Submission Engine for the Storefront Counter
//!
//! This crate owns every network call, the session lifecycle and the
//! submission workflow. The UI shell drives it through [`ClientContext`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Counter Client Engine                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      ClientContext                               │  │
//! │  │  Built once at start-up; hands explicit references to screens   │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ SessionManager │  │ MasterDataCache│  │  OrderSubmissionFlow   │    │
//! │  │                │  │                │  │  ExpenseSubmissionFlow │    │
//! │  │ JWT decode     │  │ 4 concurrent   │  │                        │    │
//! │  │ exp check      │  │ fetches, per-  │  │ validate → POST →      │    │
//! │  │ login/logout   │  │ category       │  │ 201+"success" →        │    │
//! │  │ gates all I/O  │  │ degradation    │  │ reset + notify         │    │
//! │  └───────┬────────┘  └────────────────┘  └────────────────────────┘    │
//! │          │                                                              │
//! │  ┌───────▼────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  TokenStore    │  │  PriceQuoter   │  │  ReportsClient         │    │
//! │  │  SQLite / mem  │  │  per-revision  │  │  Preferences           │    │
//! │  │                │  │  confirmation  │  │  Notifier              │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  Every request goes through HttpTransport (reqwest, bearer, timeout)   │
//! │  and is decoded as Envelope::Success(data) | Envelope::Failure.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! ### Plumbing
//! - [`config`] - Layered client configuration (defaults, TOML, env)
//! - [`error`] - Client error taxonomy
//! - [`api`] - HTTP transport seam and response envelope
//! - [`jwt`] - Access-token payload decoding
//! - [`token_store`] - Persistent session and preference entries
//!
//! ### Workflows
//! - [`session`] - `SessionManager` state machine
//! - [`master_data`] - `MasterDataCache`
//! - [`quote`] - Server price confirmation per line revision
//! - [`submission`] - Order and expense submission
//! - [`reports`] - Daily summary and sales report queries
//! - [`notifier`] - Local notifications
//! - [`preferences`] - Language and push token
//! - [`context`] - Wiring
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_client::{ClientConfig, ClientContext, SessionState};
//! use storefront_core::DraftOrder;
//!
//! let config = ClientConfig::load_or_default(None);
//! let client = ClientContext::open(&config).await?;
//!
//! if client.start().await == SessionState::Unauthenticated {
//!     client.session.sign_in("alice", "s3cret").await?;
//! }
//!
//! let report = client.master_data.load().await?;
//! if let Some(warning) = report.error {
//!     eprintln!("{}", warning.user_message());
//! }
//!
//! let mut draft = DraftOrder::new();
//! // ... edits via draft.update_line(...)
//! let saved = client.orders.submit(&mut draft).await?;
//! println!("Saved {}", saved.amount);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod jwt;
pub mod master_data;
pub mod notifier;
pub mod preferences;
pub mod quote;
pub mod reports;
pub mod session;
pub mod submission;
pub mod token_store;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{ApiResponse, Envelope, HttpTransport, ReqwestTransport};
pub use config::{ClientConfig, Environment};
pub use context::ClientContext;
pub use error::{ClientError, ClientResult};
pub use master_data::{LoadReport, MasterDataCache, MasterDataCategory};
pub use notifier::{ChannelNotifier, LogNotifier, Notification, Notifier, SilentNotifier};
pub use preferences::Preferences;
pub use quote::{PriceQuoter, Quote};
pub use reports::{DailySummary, ReportsClient, SaleReportRow, SalesFilter};
pub use session::{Session, SessionManager, SessionState};
pub use submission::{ExpenseSubmissionFlow, OrderSubmissionFlow};
pub use token_store::{MemoryTokenStore, SqliteTokenStore, StorageKey, TokenStore};
