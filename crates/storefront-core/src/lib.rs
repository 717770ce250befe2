//! # storefront-core: Pure Business Logic for the Storefront Counter
//!
//! This crate is the **heart** of the counter client. It contains the pricing
//! and draft rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Counter Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI shell (out of tree)                       │   │
//! │  │    Sales entry ──► Expense entry ──► Reports ──► Settings       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storefront-client                            │   │
//! │  │    SessionManager, MasterDataCache, OrderSubmissionFlow         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  catalog  │  │  pricing  │  │ validation│  │   │
//! │  │   │   Money   │  │ MasterData│  │ line/order│  │   drafts  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Catalog entries, line items, drafts
//! - [`catalog`] - In-memory master data snapshot and eligibility lookups
//! - [`pricing`] - Line amounts and order totals
//! - [`validation`] - Draft validation before submission
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::pricing;
//! use storefront_core::types::{Flavour, Product};
//!
//! let kulfi = Product::new(1, "Kulfi", Money::from_cents(2000))
//!     .with_parcel_price(Money::from_cents(500));
//! let mango = Flavour::new(4, "Mango", Money::from_cents(300));
//!
//! // (20 + 3 + 5) × 2 = 56.00
//! let amount = pricing::compute_line_amount(Some(&kulfi), Some(&mango), None, true, Some(2));
//! assert_eq!(amount, Money::from_cents(5600));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::MasterData;
pub use error::{CoreError, DraftField, MissingField, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single draft order.
pub const MAX_DRAFT_LINES: usize = 50;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Catches typos like 1000 instead of 10 before they reach the server.
pub const MAX_LINE_QUANTITY: i64 = 999;
