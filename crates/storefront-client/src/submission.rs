//! # Submission Flows
//!
//! Turns a validated draft into a `POST` and interprets the answer.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(&mut draft)                                                     │
//! │    │                                                                    │
//! │    ├── reconcile a copy against the MasterDataCache snapshot            │
//! │    ├── validate_order(copy) ──✗──► ClientError::Validation              │
//! │    │                                (nothing sent, draft untouched)     │
//! │    ├── session.access_token() ──✗──► ExpiredSession / NotAuthenticated  │
//! │    │                                                                    │
//! │    ├── POST /orders {paymentMode, totalAmount, items[...]}              │
//! │    │        │                                                           │
//! │    │        ├── transport failure ──► Network / Timeout                 │
//! │    │        ├── not (201 + "success") ──► Submission{status, message}   │
//! │    │        │                                                           │
//! │    │        ▼ 201 + "success"                                           │
//! │    ├── record LastSubmission {amount, label, timestamp}                 │
//! │    ├── draft.reset()  (one blank line)                                  │
//! │    └── notifier.notify(...)  exactly once                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Expenses follow the same steps against `POST /expenses`.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use storefront_core::money::{self, Money};
use storefront_core::validation::{validate_expense, validate_order};
use storefront_core::{
    DraftOrder, ExpenseDraft, LastSubmission, LineItem, PaymentMode, SubmissionKind,
    ValidationError,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::HttpTransport;
use crate::error::{ClientError, ClientResult};
use crate::master_data::MasterDataCache;
use crate::notifier::{Notification, Notifier};
use crate::session::SessionManager;

/// The only HTTP status that counts as a successful submission.
pub const CREATED: u16 = 201;

// =============================================================================
// Wire Payloads
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload {
    payment_mode: PaymentMode,
    #[serde(with = "money::major_units")]
    total_amount: Money,
    items: Vec<OrderItemPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemPayload {
    product_id: i64,
    flavour_id: Option<i64>,
    add_on_id: Option<i64>,
    quantity: i64,
    is_parcel: bool,
    is_custom_price: bool,
    #[serde(with = "money::major_units::option")]
    sale_price: Option<Money>,
    #[serde(with = "money::major_units")]
    amount: Money,
}

impl OrderItemPayload {
    fn from_line(line: &LineItem) -> ClientResult<Self> {
        Ok(OrderItemPayload {
            product_id: line.product_id.ok_or_else(|| incomplete("product"))?,
            flavour_id: line.flavour_id,
            add_on_id: line.add_on_id,
            quantity: line.quantity.ok_or_else(|| incomplete("quantity"))?,
            is_parcel: line.is_parcel,
            is_custom_price: line.is_custom_price,
            sale_price: line.sale_price,
            amount: line.effective_amount(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpensePayload<'a> {
    item: &'a str,
    category_id: i64,
    unit_id: Option<i64>,
    quantity: i64,
    #[serde(with = "money::major_units")]
    amount: Money,
    payment_mode: PaymentMode,
}

/// Only reachable if a draft changed between validation and serialization.
fn incomplete(field: &str) -> ClientError {
    ClientError::Validation(ValidationError::Required {
        field: field.to_string(),
    })
}

fn encode<T: Serialize>(payload: T) -> ClientResult<Value> {
    serde_json::to_value(payload).map_err(|e| {
        ClientError::Validation(ValidationError::InvalidFormat {
            field: "payload".to_string(),
            reason: e.to_string(),
        })
    })
}

/// Builds the `/orders` body. The draft must already be valid.
pub fn order_payload(draft: &DraftOrder) -> ClientResult<Value> {
    let payload = OrderPayload {
        payment_mode: draft
            .payment_mode
            .ok_or_else(|| incomplete("payment mode"))?,
        total_amount: draft.total_amount(),
        items: draft
            .lines
            .iter()
            .map(OrderItemPayload::from_line)
            .collect::<ClientResult<_>>()?,
    };
    encode(payload)
}

/// Builds the `/expenses` body. The draft must already be valid.
pub fn expense_payload(draft: &ExpenseDraft) -> ClientResult<Value> {
    let payload = ExpensePayload {
        item: draft.item.trim(),
        category_id: draft
            .category_id
            .ok_or_else(|| incomplete("category"))?,
        unit_id: draft.unit_id,
        quantity: draft
            .quantity
            .ok_or_else(|| incomplete("quantity"))?,
        amount: draft.amount.ok_or_else(|| incomplete("amount"))?,
        payment_mode: draft
            .payment_mode
            .ok_or_else(|| incomplete("payment mode"))?,
    };
    encode(payload)
}

/// POSTs with the bearer token; anything but `201` + `"success"` fails.
async fn post_created(
    session: &SessionManager,
    http: &dyn HttpTransport,
    path: &str,
    body: &Value,
) -> ClientResult<()> {
    let token = session.access_token().await?;
    let response = http.post(path, Some(&token), body).await.map_err(|e| {
        warn!(path = %path, error = %e, "Submission did not reach the server");
        e
    })?;

    if response.status == CREATED && response.is_success_envelope() {
        return Ok(());
    }
    warn!(path = %path, status = response.status, "Submission rejected");
    Err(response.into_failure())
}

fn item_label(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", count)
    }
}

// =============================================================================
// Order Submission
// =============================================================================

pub struct OrderSubmissionFlow {
    session: Arc<SessionManager>,
    master_data: Arc<MasterDataCache>,
    http: Arc<dyn HttpTransport>,
    notifier: Arc<dyn Notifier>,
    last: RwLock<Option<LastSubmission>>,
}

impl OrderSubmissionFlow {
    pub fn new(
        session: Arc<SessionManager>,
        master_data: Arc<MasterDataCache>,
        http: Arc<dyn HttpTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        OrderSubmissionFlow {
            session,
            master_data,
            http,
            notifier,
            last: RwLock::new(None),
        }
    }

    /// Checks the draft without sending anything.
    pub fn validate(draft: &DraftOrder) -> ClientResult<()> {
        validate_order(draft)?;
        Ok(())
    }

    /// Validates, sends and, on success, resets `draft`.
    ///
    /// Client-priced lines are repriced against the current master data
    /// before anything is checked, so the payload always carries amounts
    /// that match the lines. On any failure the draft is left exactly as it
    /// was.
    pub async fn submit(&self, draft: &mut DraftOrder) -> ClientResult<LastSubmission> {
        let catalog = self.master_data.snapshot().await;
        let mut order = draft.clone();
        let repriced = order.reconcile(&catalog);
        if repriced > 0 {
            debug!(lines = repriced, "Repriced lines before submission");
        }

        Self::validate(&order)?;
        let body = order_payload(&order)?;

        post_created(&self.session, self.http.as_ref(), "/orders", &body).await?;

        let snapshot = LastSubmission {
            kind: SubmissionKind::Order,
            label: item_label(order.lines.len()),
            amount: order.total_amount(),
            submitted_at: Utc::now(),
        };
        info!(items = order.lines.len(), amount = %snapshot.amount, "Order submitted");

        draft.reset();
        *self.last.write().await = Some(snapshot.clone());
        self.notifier.notify(Notification::new(
            "Order saved",
            format!("{} · {}", snapshot.label, snapshot.amount),
        ));
        Ok(snapshot)
    }

    pub async fn last_submission(&self) -> Option<LastSubmission> {
        self.last.read().await.clone()
    }
}

// =============================================================================
// Expense Submission
// =============================================================================

pub struct ExpenseSubmissionFlow {
    session: Arc<SessionManager>,
    http: Arc<dyn HttpTransport>,
    notifier: Arc<dyn Notifier>,
    last: RwLock<Option<LastSubmission>>,
}

impl ExpenseSubmissionFlow {
    pub fn new(
        session: Arc<SessionManager>,
        http: Arc<dyn HttpTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ExpenseSubmissionFlow {
            session,
            http,
            notifier,
            last: RwLock::new(None),
        }
    }

    pub fn validate(draft: &ExpenseDraft) -> ClientResult<()> {
        validate_expense(draft)?;
        Ok(())
    }

    pub async fn submit(&self, draft: &mut ExpenseDraft) -> ClientResult<LastSubmission> {
        Self::validate(draft)?;
        let body = expense_payload(draft)?;

        post_created(&self.session, self.http.as_ref(), "/expenses", &body).await?;

        let snapshot = LastSubmission {
            kind: SubmissionKind::Expense,
            label: draft.item.trim().to_string(),
            amount: draft.amount.unwrap_or_default(),
            submitted_at: Utc::now(),
        };
        info!(item = %snapshot.label, amount = %snapshot.amount, "Expense submitted");

        draft.reset();
        *self.last.write().await = Some(snapshot.clone());
        self.notifier.notify(Notification::new(
            "Expense saved",
            format!("{} · {}", snapshot.label, snapshot.amount),
        ));
        Ok(snapshot)
    }

    pub async fn last_submission(&self) -> Option<LastSubmission> {
        self.last.read().await.clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
