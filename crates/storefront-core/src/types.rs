//! # Domain Types
//!
//! Core domain types used throughout the counter client.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Master data (immutable per session)                                   │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ Flavour / AddOn │   │ PaymentMethod   │       │
//! │  │  id, name       │   │  id, name       │   │  id, name       │       │
//! │  │  unit_price     │   │  price          │   └─────────────────┘       │
//! │  │  parcel_price   │   │  (surcharge)    │   ┌─────────────────┐       │
//! │  │  flavour_ids    │   └─────────────────┘   │ Unit / Category │       │
//! │  │  add_on_ids     │                         │ (expenses)      │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  Drafts (mutated on every edit)                                        │
//! │  ┌─────────────────────────────┐   ┌─────────────────────────────┐     │
//! │  │ DraftOrder                  │   │ ExpenseDraft                │     │
//! │  │  lines: Vec<LineItem>       │   │  item, category, unit       │     │
//! │  │  payment_mode: CASH | UPI   │   │  quantity, amount, payment  │     │
//! │  └─────────────────────────────┘   └─────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::MasterData;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing;
use crate::MAX_DRAFT_LINES;

// =============================================================================
// Master Data
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Base price per unit.
    pub unit_price: Money,
    /// Extra charge per unit when packed for takeaway.
    pub parcel_price: Option<Money>,
    /// Flavours that may be chosen with this product.
    pub flavour_ids: Vec<i64>,
    /// Add-ons that may be chosen with this product.
    pub add_on_ids: Vec<i64>,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>, unit_price: Money) -> Self {
        Product {
            id,
            name: name.into(),
            unit_price,
            parcel_price: None,
            flavour_ids: Vec::new(),
            add_on_ids: Vec::new(),
        }
    }

    pub fn with_parcel_price(mut self, parcel_price: Money) -> Self {
        self.parcel_price = Some(parcel_price);
        self
    }

    pub fn with_flavours(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.flavour_ids = ids.into_iter().collect();
        self
    }

    pub fn with_add_ons(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.add_on_ids = ids.into_iter().collect();
        self
    }

    #[inline]
    pub fn allows_flavour(&self, flavour_id: i64) -> bool {
        self.flavour_ids.contains(&flavour_id)
    }

    #[inline]
    pub fn allows_add_on(&self, add_on_id: i64) -> bool {
        self.add_on_ids.contains(&add_on_id)
    }
}

/// A flavour option; its price is an additive surcharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Flavour {
    pub id: i64,
    pub name: String,
    pub price: Money,
}

impl Flavour {
    pub fn new(id: i64, name: impl Into<String>, price: Money) -> Self {
        Flavour {
            id,
            name: name.into(),
            price,
        }
    }
}

/// An add-on option (extra topping, scoop, ...); additive surcharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AddOn {
    pub id: i64,
    pub name: String,
    pub price: Money,
}

impl AddOn {
    pub fn new(id: i64, name: impl Into<String>, price: Money) -> Self {
        AddOn {
            id,
            name: name.into(),
            price,
        }
    }
}

/// A payment method offered by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentMethodOption {
    pub id: i64,
    pub name: String,
}

impl PaymentMethodOption {
    /// Maps the display name onto the submission enum, if it is one we know.
    pub fn mode(&self) -> Option<PaymentMode> {
        self.name.parse().ok()
    }
}

/// A unit of measure for expenses (kg, litre, piece, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Unit {
    pub id: i64,
    pub name: String,
}

/// An expense category (raw material, rent, wages, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer paid (or how an expense was paid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "CASH"),
            PaymentMode::Upi => write!(f, "UPI"),
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            other => Err(format!("Unknown payment mode: '{}'", other)),
        }
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// The signed-in user, decoded from the access token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl UserProfile {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// Where a line's `amount` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AmountSource {
    /// Not enough input yet.
    #[default]
    Unset,
    /// Computed locally by the pricing engine.
    Client,
    /// Confirmed by the server for the line's current revision.
    Server,
    /// Entered by the user (custom price override).
    Custom,
}

/// One product/flavour/add-on/parcel/quantity combination in a draft order.
///
/// ## Invariant
/// When `is_custom_price` is false, `sale_price`/`amount` always equal what
/// [`pricing::compute_line_amount`] yields for the current inputs (or a
/// server-confirmed amount for the current `revision`). Edits go through
/// [`DraftOrder::update_line`], which bumps `revision` and reprices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Client-side key, stable across edits.
    pub key: String,
    pub product_id: Option<i64>,
    pub flavour_id: Option<i64>,
    pub add_on_id: Option<i64>,
    pub quantity: Option<i64>,
    pub is_parcel: bool,
    pub is_custom_price: bool,
    /// Price per unit when computed; the whole line when custom.
    pub sale_price: Option<Money>,
    /// Line total.
    pub amount: Option<Money>,
    pub amount_source: AmountSource,
    /// Bumped on every edit; quotes for older revisions are discarded.
    pub revision: u64,
}

impl LineItem {
    /// A blank line, as shown when the user taps "add item".
    pub fn blank() -> Self {
        LineItem {
            key: Uuid::new_v4().to_string(),
            product_id: None,
            flavour_id: None,
            add_on_id: None,
            quantity: None,
            is_parcel: false,
            is_custom_price: false,
            sale_price: None,
            amount: None,
            amount_source: AmountSource::Unset,
            revision: 0,
        }
    }

    /// The amount this line contributes to the order total.
    pub fn effective_amount(&self) -> Money {
        let value = if self.is_custom_price {
            self.sale_price
        } else {
            self.amount
        };
        value.unwrap_or_default()
    }

    /// True when the user has not touched any field.
    pub fn is_blank(&self) -> bool {
        self.product_id.is_none()
            && self.quantity.is_none()
            && self.sale_price.is_none()
            && self.amount.is_none()
    }
}

// =============================================================================
// Draft Order
// =============================================================================

/// An in-progress, unsubmitted sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DraftOrder {
    pub lines: Vec<LineItem>,
    pub payment_mode: Option<PaymentMode>,
}

impl Default for DraftOrder {
    fn default() -> Self {
        DraftOrder::new()
    }
}

impl DraftOrder {
    /// A fresh draft with one blank line.
    pub fn new() -> Self {
        DraftOrder {
            lines: vec![LineItem::blank()],
            payment_mode: None,
        }
    }

    /// Discards everything and starts over with one blank line.
    pub fn reset(&mut self) {
        *self = DraftOrder::new();
    }

    /// Appends a blank line and returns its key.
    pub fn add_line(&mut self) -> CoreResult<String> {
        if self.lines.len() >= MAX_DRAFT_LINES {
            return Err(CoreError::DraftTooLarge {
                max: MAX_DRAFT_LINES,
            });
        }
        let line = LineItem::blank();
        let key = line.key.clone();
        self.lines.push(line);
        Ok(key)
    }

    /// Removes one line. The last remaining line is replaced by a blank one
    /// so the form never shows zero rows.
    pub fn remove_line(&mut self, key: &str) -> CoreResult<()> {
        let index = self.index_of(key)?;
        self.lines.remove(index);
        if self.lines.is_empty() {
            self.lines.push(LineItem::blank());
        }
        Ok(())
    }

    pub fn line(&self, key: &str) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Applies an edit to one line, bumps its revision and reprices it.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::{DraftOrder, MasterData, Money, Product};
    ///
    /// let catalog = MasterData::default()
    ///     .with_products(vec![Product::new(1, "Kulfi", Money::from_cents(2000))]);
    /// let mut draft = DraftOrder::new();
    /// let key = draft.lines[0].key.clone();
    ///
    /// let line = draft
    ///     .update_line(&key, &catalog, |l| {
    ///         l.product_id = Some(1);
    ///         l.quantity = Some(3);
    ///     })
    ///     .unwrap();
    /// assert_eq!(line.amount, Some(Money::from_cents(6000)));
    /// ```
    pub fn update_line(
        &mut self,
        key: &str,
        catalog: &MasterData,
        edit: impl FnOnce(&mut LineItem),
    ) -> CoreResult<&LineItem> {
        let index = self.index_of(key)?;
        let line = &mut self.lines[index];
        edit(line);
        line.revision = line.revision.wrapping_add(1);
        pricing::reprice_line(line, catalog);
        Ok(&self.lines[index])
    }

    /// Recomputes every non-custom line, e.g. after master data reloads.
    pub fn reprice_all(&mut self, catalog: &MasterData) {
        for line in &mut self.lines {
            line.revision = line.revision.wrapping_add(1);
            pricing::reprice_line(line, catalog);
        }
    }

    /// Reprices client-priced lines whose stored amount no longer matches
    /// their inputs, e.g. after fields were assigned directly.
    ///
    /// Custom-price lines, server-confirmed lines and lines whose product is
    /// not in `catalog` are left alone. Returns the number of lines changed.
    pub fn reconcile(&mut self, catalog: &MasterData) -> usize {
        let mut changed = 0;
        for line in &mut self.lines {
            if line.is_custom_price || line.amount_source == AmountSource::Server {
                continue;
            }
            if line.product_id.and_then(|id| catalog.product(id)).is_none() {
                continue;
            }

            let mut repriced = line.clone();
            pricing::reprice_line(&mut repriced, catalog);
            if repriced != *line {
                repriced.revision = line.revision.wrapping_add(1);
                *line = repriced;
                changed += 1;
            }
        }
        changed
    }

    /// Sum of current line amounts. Recomputed on every call.
    pub fn total_amount(&self) -> Money {
        pricing::compute_order_total(&self.lines)
    }

    fn index_of(&self, key: &str) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.key == key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))
    }
}

// =============================================================================
// Expense Draft
// =============================================================================

/// An in-progress expense record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseDraft {
    pub item: String,
    pub category_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub quantity: Option<i64>,
    pub amount: Option<Money>,
    pub payment_mode: Option<PaymentMode>,
}

impl ExpenseDraft {
    pub fn reset(&mut self) {
        *self = ExpenseDraft::default();
    }
}

// =============================================================================
// Last Submission
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SubmissionKind {
    Order,
    Expense,
}

/// Snapshot of the most recent successful submission, for transient UI
/// feedback ("Saved ₹56.00 · 2 items").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LastSubmission {
    pub kind: SubmissionKind,
    pub label: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub submitted_at: DateTime<Utc>,
}

impl LastSubmission {
    /// Whether the banner should still be shown at `now`.
    pub fn is_recent(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now.signed_duration_since(self.submitted_at) <= window
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MasterData {
        MasterData::default()
            .with_products(vec![Product::new(1, "Kulfi", Money::from_cents(2000))
                .with_parcel_price(Money::from_cents(500))
                .with_flavours([4])])
            .with_flavours(vec![Flavour::new(4, "Mango", Money::from_cents(300))])
    }

    #[test]
    fn test_new_draft_has_one_blank_line() {
        let draft = DraftOrder::new();
        assert_eq!(draft.lines.len(), 1);
        assert!(draft.lines[0].is_blank());
        assert_eq!(draft.total_amount(), Money::zero());
    }

    #[test]
    fn test_update_line_bumps_revision_and_reprices() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();

        draft
            .update_line(&key, &catalog, |l| l.product_id = Some(1))
            .unwrap();
        let line = draft
            .update_line(&key, &catalog, |l| {
                l.quantity = Some(2);
                l.flavour_id = Some(4);
                l.is_parcel = true;
            })
            .unwrap();

        assert_eq!(line.revision, 2);
        assert_eq!(line.sale_price, Some(Money::from_cents(2800)));
        assert_eq!(line.amount, Some(Money::from_cents(5600)));
        assert_eq!(line.amount_source, AmountSource::Client);
        assert_eq!(draft.total_amount(), Money::from_cents(5600));
    }

    #[test]
    fn test_reconcile_reprices_directly_edited_lines() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();
        draft
            .update_line(&key, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(2);
            })
            .unwrap();
        assert_eq!(draft.reconcile(&catalog), 0);

        // Assigned without going through update_line
        draft.lines[0].quantity = Some(5);
        assert_eq!(draft.lines[0].amount, Some(Money::from_cents(4000)));

        assert_eq!(draft.reconcile(&catalog), 1);
        let line = &draft.lines[0];
        assert_eq!(line.amount, Some(Money::from_cents(10000)));
        assert_eq!(line.revision, 2);
        assert_eq!(draft.total_amount(), Money::from_cents(10000));
    }

    #[test]
    fn test_reconcile_leaves_custom_server_and_unknown_lines() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let custom = draft.lines[0].key.clone();
        draft
            .update_line(&custom, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(1);
                l.is_custom_price = true;
                l.sale_price = Some(Money::from_cents(1500));
            })
            .unwrap();

        let confirmed = draft.add_line().unwrap();
        draft
            .update_line(&confirmed, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(2);
            })
            .unwrap();
        let revision = draft.line(&confirmed).unwrap().revision;
        assert!(pricing::apply_confirmed_amount(
            &mut draft.lines[1],
            revision,
            Money::from_cents(3900)
        ));

        let unknown = draft.add_line().unwrap();
        draft
            .update_line(&unknown, &catalog, |l| {
                l.product_id = Some(99);
                l.quantity = Some(1);
            })
            .unwrap();

        let before = draft.clone();
        assert_eq!(draft.reconcile(&MasterData::default()), 0);
        assert_eq!(draft.reconcile(&catalog), 0);
        assert_eq!(draft, before);
    }

    #[test]
    fn test_revision_wraps_instead_of_overflowing() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();
        draft.lines[0].revision = u64::MAX;

        let line = draft
            .update_line(&key, &catalog, |l| l.quantity = Some(1))
            .unwrap();
        assert_eq!(line.revision, 0);
    }

    #[test]
    fn test_remove_last_line_leaves_blank_line() {
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();
        draft.remove_line(&key).unwrap();
        assert_eq!(draft.lines.len(), 1);
        assert_ne!(draft.lines[0].key, key);

        assert!(matches!(
            draft.remove_line("missing"),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_add_line_respects_limit() {
        let mut draft = DraftOrder::new();
        for _ in 1..MAX_DRAFT_LINES {
            draft.add_line().unwrap();
        }
        assert!(matches!(
            draft.add_line(),
            Err(CoreError::DraftTooLarge { .. })
        ));
    }

    #[test]
    fn test_reset_discards_lines_and_payment_mode() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();
        draft
            .update_line(&key, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(1);
            })
            .unwrap();
        draft.add_line().unwrap();
        draft.payment_mode = Some(PaymentMode::Upi);

        draft.reset();
        assert_eq!(draft.lines.len(), 1);
        assert!(draft.lines[0].is_blank());
        assert_eq!(draft.payment_mode, None);
    }

    #[test]
    fn test_payment_mode_parsing_and_wire_format() {
        assert_eq!("Cash".parse::<PaymentMode>().unwrap(), PaymentMode::Cash);
        assert_eq!(" upi ".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert!("card".parse::<PaymentMode>().is_err());

        assert_eq!(
            serde_json::to_value(PaymentMode::Upi).unwrap(),
            serde_json::json!("UPI")
        );
        let option = PaymentMethodOption {
            id: 1,
            name: "CASH".to_string(),
        };
        assert_eq!(option.mode(), Some(PaymentMode::Cash));
    }

    #[test]
    fn test_last_submission_window() {
        let at = Utc::now();
        let snapshot = LastSubmission {
            kind: SubmissionKind::Order,
            label: "2 items".to_string(),
            amount: Money::from_cents(5600),
            submitted_at: at,
        };
        let window = chrono::Duration::seconds(5);
        assert!(snapshot.is_recent(at + chrono::Duration::seconds(3), window));
        assert!(!snapshot.is_recent(at + chrono::Duration::seconds(6), window));
    }
}
