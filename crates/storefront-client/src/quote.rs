//! Server price confirmation for a single draft line.
//!
//! The client prices every edit locally; `POST /sales/calculateAmount` then
//! confirms the amount. Each quote carries the revision of the line it was
//! asked for, and applying it is a no-op once the line has moved on:
//!
//! ```text
//! rev 3: qty=2  ──quote──►  (in flight)
//! rev 4: qty=5                                  ◄── user edits
//!                    quote(rev 3) = 56.00  ──►  discarded, line stays at rev 4
//! ```
//!
//! A line without a confirmation keeps its client-computed amount, so a
//! failed quote never blocks submission.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use storefront_core::money::{self, Money};
use storefront_core::pricing::apply_confirmed_amount;
use storefront_core::{DraftOrder, LineItem};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{decode_envelope, Envelope, HttpTransport};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

/// A server-confirmed amount for one revision of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub line_key: String,
    pub revision: u64,
    pub amount: Money,
}

/// `data` is either the bare amount or `{ "amount": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuotedAmount {
    Bare(#[serde(with = "money::major_units")] Money),
    Wrapped {
        #[serde(with = "money::major_units")]
        amount: Money,
    },
}

impl QuotedAmount {
    fn into_money(self) -> Money {
        match self {
            QuotedAmount::Bare(amount) | QuotedAmount::Wrapped { amount } => amount,
        }
    }
}

pub struct PriceQuoter {
    http: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
}

impl PriceQuoter {
    pub fn new(http: Arc<dyn HttpTransport>, session: Arc<SessionManager>) -> Self {
        PriceQuoter { http, session }
    }

    /// Asks the server to price `line` as it is now.
    ///
    /// Returns `Ok(None)` without a request for custom-price lines and lines
    /// that lack a product or a positive quantity.
    pub async fn quote(&self, line: &LineItem) -> ClientResult<Option<Quote>> {
        if line.is_custom_price {
            return Ok(None);
        }
        let (product_id, quantity) = match (line.product_id, line.quantity) {
            (Some(product_id), Some(quantity)) if quantity > 0 => (product_id, quantity),
            _ => return Ok(None),
        };

        let token = self.session.access_token().await?;
        let body = json!({
            "productId": product_id,
            "flavourId": line.flavour_id,
            "addOnId": line.add_on_id,
            "quantity": quantity,
            "isParcel": line.is_parcel,
        });
        let response = self
            .http
            .post("/sales/calculateAmount", Some(&token), &body)
            .await?;

        match decode_envelope::<QuotedAmount>(&response.body) {
            Envelope::Success(amount) => {
                let amount = amount.into_money();
                debug!(line = %line.key, revision = line.revision, amount = %amount, "Quote received");
                Ok(Some(Quote {
                    line_key: line.key.clone(),
                    revision: line.revision,
                    amount,
                }))
            }
            Envelope::Failure { message } => {
                Err(ClientError::submission(Some(response.status), message))
            }
        }
    }

    /// Applies `quote` if its line still exists at the quoted revision.
    pub fn apply(draft: &mut DraftOrder, quote: &Quote) -> bool {
        let applied = draft
            .lines
            .iter_mut()
            .find(|line| line.key == quote.line_key)
            .is_some_and(|line| apply_confirmed_amount(line, quote.revision, quote.amount));
        if !applied {
            debug!(line = %quote.line_key, revision = quote.revision, "Discarded stale quote");
        }
        applied
    }

    /// Quotes one line of a shared draft without holding the lock across
    /// the request. Returns whether the confirmation was applied.
    pub async fn confirm_line(&self, draft: &Mutex<DraftOrder>, key: &str) -> ClientResult<bool> {
        let line = match draft.lock().await.line(key) {
            Some(line) => line.clone(),
            None => return Ok(false),
        };

        match self.quote(&line).await? {
            Some(quote) => Ok(Self::apply(&mut *draft.lock().await, &quote)),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for PriceQuoter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceQuoter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signed_in, FakeTransport};
    use storefront_core::{AmountSource, Flavour, MasterData, Product};

    fn catalog() -> MasterData {
        MasterData::default()
            .with_products(vec![Product::new(1, "Kulfi", Money::from_cents(2000))
                .with_parcel_price(Money::from_cents(500))
                .with_flavours([4])])
            .with_flavours(vec![Flavour::new(4, "Mango", Money::from_cents(300))])
    }

    fn filled_draft() -> (DraftOrder, String) {
        let mut draft = DraftOrder::new();
        let key = draft.lines[0].key.clone();
        draft
            .update_line(&key, &catalog(), |l| {
                l.product_id = Some(1);
                l.flavour_id = Some(4);
                l.quantity = Some(2);
                l.is_parcel = true;
            })
            .unwrap();
        (draft, key)
    }

    #[tokio::test]
    async fn test_quote_posts_line_and_applies() {
        let http = FakeTransport::new();
        http.respond_ok("/sales/calculateAmount", json!(55.5));
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);
        let (mut draft, key) = filled_draft();
        assert_eq!(draft.total_amount(), Money::from_cents(5600));

        let quote = quoter.quote(draft.line(&key).unwrap()).await.unwrap().unwrap();
        assert_eq!(quote.amount, Money::from_cents(5550));

        let sent = http.requests_to("/sales/calculateAmount");
        assert_eq!(
            sent[0].body,
            Some(json!({
                "productId": 1, "flavourId": 4, "addOnId": null,
                "quantity": 2, "isParcel": true,
            }))
        );
        assert!(sent[0].bearer.is_some());

        assert!(PriceQuoter::apply(&mut draft, &quote));
        let line = draft.line(&key).unwrap();
        assert_eq!(line.amount_source, AmountSource::Server);
        assert_eq!(draft.total_amount(), Money::from_cents(5550));
    }

    #[tokio::test]
    async fn test_stale_quote_is_discarded() {
        let http = FakeTransport::new();
        http.respond_ok("/sales/calculateAmount", json!({"amount": "56.00"}));
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);
        let (mut draft, key) = filled_draft();

        let quote = quoter.quote(draft.line(&key).unwrap()).await.unwrap().unwrap();

        // The user changes the quantity while the quote is in flight
        draft
            .update_line(&key, &catalog(), |l| l.quantity = Some(5))
            .unwrap();
        assert!(!PriceQuoter::apply(&mut draft, &quote));

        let line = draft.line(&key).unwrap();
        assert_eq!(line.amount, Some(Money::from_cents(14000)));
        assert_eq!(line.amount_source, AmountSource::Client);

        // A removed line cannot take a quote either
        draft.remove_line(&key).unwrap();
        assert!(!PriceQuoter::apply(&mut draft, &quote));
    }

    #[tokio::test]
    async fn test_incomplete_and_custom_lines_are_not_quoted() {
        let http = FakeTransport::new();
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);

        let blank = LineItem::blank();
        assert_eq!(quoter.quote(&blank).await.unwrap(), None);

        let (draft, key) = filled_draft();
        let mut custom = draft.line(&key).unwrap().clone();
        custom.is_custom_price = true;
        assert_eq!(quoter.quote(&custom).await.unwrap(), None);

        assert!(http.requests_to("/sales/calculateAmount").is_empty());
    }

    #[tokio::test]
    async fn test_confirm_line_on_shared_draft() {
        let http = FakeTransport::new();
        http.respond_ok("/sales/calculateAmount", json!({"amount": 54}));
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);
        let (draft, key) = filled_draft();
        let draft = Mutex::new(draft);

        assert!(quoter.confirm_line(&draft, &key).await.unwrap());
        assert_eq!(draft.lock().await.total_amount(), Money::from_cents(5400));
        assert!(!quoter.confirm_line(&draft, "missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_line_discards_quote_for_line_edited_in_flight() {
        let http = FakeTransport::new();
        http.respond_ok("/sales/calculateAmount", json!({"amount": 54}));
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);
        let (draft, key) = filled_draft();
        let draft = Arc::new(Mutex::new(draft));

        // The user bumps the quantity while the request is on the wire
        let shared = draft.clone();
        let edited = key.clone();
        http.during("/sales/calculateAmount", move || {
            let mut draft = shared.try_lock().unwrap();
            draft
                .update_line(&edited, &catalog(), |l| l.quantity = Some(5))
                .unwrap();
        });

        assert!(!quoter.confirm_line(&draft, &key).await.unwrap());
        assert_eq!(http.requests_to("/sales/calculateAmount").len(), 1);

        let draft = draft.lock().await;
        let line = draft.line(&key).unwrap();
        assert_eq!(line.quantity, Some(5));
        assert_eq!(line.amount, Some(Money::from_cents(14000)));
        assert_eq!(line.amount_source, AmountSource::Client);
    }

    #[tokio::test]
    async fn test_rejected_quote_leaves_client_amount() {
        let http = FakeTransport::new();
        http.respond(
            "/sales/calculateAmount",
            400,
            json!({"status": "error", "message": "Flavour not available"}),
        );
        let quoter = PriceQuoter::new(http.clone(), signed_in(http.clone()).await);
        let (draft, key) = filled_draft();
        let draft = Mutex::new(draft);

        let err = quoter.confirm_line(&draft, &key).await.unwrap_err();
        assert_eq!(err.user_message(), "Flavour not available");
        assert_eq!(draft.lock().await.total_amount(), Money::from_cents(5600));
    }
}
