//! # Master Data Cache
//!
//! Fetches the reference catalog once per session and serves lookups from
//! an in-memory snapshot.
//!
//! ## Load Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load()                                                                 │
//! │    │  token = session.access_token()      (no token → no requests)      │
//! │    │                                                                    │
//! │    ├── GET /products ────────┐                                          │
//! │    ├── GET /flavours ────────┤  tokio::join! (wait for all four)        │
//! │    ├── GET /addons ──────────┤                                          │
//! │    └── GET /payment-methods ─┘                                          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │    per category: Success(data) → records     Failure → [] + warn!       │
//! │                  (entries without an id are dropped)                    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │    LoadReport { data, error: first category failure }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed payment-methods category falls back to
//! [`storefront_core::catalog::default_payment_methods`] rather than an
//! empty list; the failure is still reported.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use storefront_core::catalog::default_payment_methods;
use storefront_core::money::{self, Money};
use storefront_core::{AddOn, Category, Flavour, MasterData, PaymentMethodOption, Product, Unit};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{decode_envelope, Envelope, HttpTransport};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

// =============================================================================
// Categories
// =============================================================================

/// One independently fetched slice of master data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterDataCategory {
    Products,
    Flavours,
    AddOns,
    PaymentMethods,
    Units,
    Categories,
}

impl MasterDataCategory {
    pub fn path(&self) -> &'static str {
        match self {
            MasterDataCategory::Products => "/products",
            MasterDataCategory::Flavours => "/flavours",
            MasterDataCategory::AddOns => "/addons",
            MasterDataCategory::PaymentMethods => "/payment-methods",
            MasterDataCategory::Units => "/units",
            MasterDataCategory::Categories => "/categories",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MasterDataCategory::Products => "products",
            MasterDataCategory::Flavours => "flavours",
            MasterDataCategory::AddOns => "add-ons",
            MasterDataCategory::PaymentMethods => "payment methods",
            MasterDataCategory::Units => "units",
            MasterDataCategory::Categories => "categories",
        }
    }
}

impl fmt::Display for MasterDataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a load: the new snapshot plus the first category failure.
#[derive(Debug)]
pub struct LoadReport {
    pub data: Arc<MasterData>,
    /// `MasterDataPartialFailure` for the first failed category, if any.
    pub error: Option<ClientError>,
    pub failed: Vec<MasterDataCategory>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// =============================================================================
// Wire Records
// =============================================================================
//
// The API is loose about types: ids arrive as numbers or numeric strings,
// prices as numbers or strings, and eligibility lists as ids or objects.
// Everything is normalised here so the rest of the crate sees i64 and Money.

/// Reads an id; `0`, `""`, `null` and non-numeric values count as absent.
fn wire_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("id").and_then(wire_id),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

fn wire_ids(values: &[Value]) -> Vec<i64> {
    values.iter().filter_map(wire_id).collect()
}

/// Text field; a number becomes its decimal text, other shapes are absent.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Price field; anything but a number or numeric string is absent.
fn lenient_money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(money::major_units::option::deserialize(value).ok().flatten())
}

fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(
        default,
        rename = "unitPrice",
        alias = "price",
        alias = "unit_price",
        deserialize_with = "lenient_money"
    )]
    unit_price: Option<Money>,
    #[serde(
        default,
        rename = "parcelPrice",
        alias = "parcel_price",
        deserialize_with = "lenient_money"
    )]
    parcel_price: Option<Money>,
    #[serde(
        default,
        rename = "flavourIds",
        alias = "flavours",
        deserialize_with = "lenient_list"
    )]
    flavour_ids: Option<Vec<Value>>,
    #[serde(
        default,
        rename = "addOnIds",
        alias = "addOns",
        alias = "addons",
        deserialize_with = "lenient_list"
    )]
    add_on_ids: Option<Vec<Value>>,
}

/// Flavours and add-ons share a shape.
#[derive(Debug, Deserialize)]
struct WireOption {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_money")]
    price: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct WireNamed {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
}

trait FromWire: Sized {
    type Wire: DeserializeOwned;

    fn from_wire(wire: Self::Wire) -> Option<Self>;
}

impl FromWire for Product {
    type Wire = WireProduct;

    fn from_wire(wire: WireProduct) -> Option<Self> {
        let mut product = Product::new(
            wire_id(&wire.id)?,
            wire.name.unwrap_or_default(),
            wire.unit_price.unwrap_or_default(),
        )
        .with_flavours(wire_ids(wire.flavour_ids.as_deref().unwrap_or_default()))
        .with_add_ons(wire_ids(wire.add_on_ids.as_deref().unwrap_or_default()));
        product.parcel_price = wire.parcel_price;
        Some(product)
    }
}

impl FromWire for Flavour {
    type Wire = WireOption;

    fn from_wire(wire: WireOption) -> Option<Self> {
        Some(Flavour::new(
            wire_id(&wire.id)?,
            wire.name.unwrap_or_default(),
            wire.price.unwrap_or_default(),
        ))
    }
}

impl FromWire for AddOn {
    type Wire = WireOption;

    fn from_wire(wire: WireOption) -> Option<Self> {
        Some(AddOn::new(
            wire_id(&wire.id)?,
            wire.name.unwrap_or_default(),
            wire.price.unwrap_or_default(),
        ))
    }
}

impl FromWire for PaymentMethodOption {
    type Wire = WireNamed;

    fn from_wire(wire: WireNamed) -> Option<Self> {
        Some(PaymentMethodOption {
            id: wire_id(&wire.id)?,
            name: wire.name.unwrap_or_default(),
        })
    }
}

impl FromWire for Unit {
    type Wire = WireNamed;

    fn from_wire(wire: WireNamed) -> Option<Self> {
        Some(Unit {
            id: wire_id(&wire.id)?,
            name: wire.name.unwrap_or_default(),
        })
    }
}

impl FromWire for Category {
    type Wire = WireNamed;

    fn from_wire(wire: WireNamed) -> Option<Self> {
        Some(Category {
            id: wire_id(&wire.id)?,
            name: wire.name.unwrap_or_default(),
        })
    }
}

/// Converts a `data` array, silently dropping unusable entries.
fn records<T: FromWire>(items: Vec<Value>, category: MasterDataCategory) -> Vec<T> {
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T::Wire>(item) {
            Ok(wire) => Some(wire),
            Err(e) => {
                debug!(category = %category, error = %e, "Unreadable entry");
                None
            }
        })
        .filter_map(T::from_wire)
        .collect();
    if kept.len() < total {
        debug!(
            category = %category,
            dropped = total - kept.len(),
            "Dropped entries without a usable id"
        );
    }
    kept
}

// =============================================================================
// Cache
// =============================================================================

/// Session-scoped master data.
pub struct MasterDataCache {
    http: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
    data: RwLock<Arc<MasterData>>,
}

impl MasterDataCache {
    pub fn new(http: Arc<dyn HttpTransport>, session: Arc<SessionManager>) -> Self {
        MasterDataCache {
            http,
            session,
            data: RwLock::new(Arc::new(MasterData::default())),
        }
    }

    /// Current snapshot. Cheap to clone and safe to hold across edits.
    pub async fn snapshot(&self) -> Arc<MasterData> {
        self.data.read().await.clone()
    }

    /// Drops the snapshot, e.g. on sign-out.
    pub async fn clear(&self) {
        *self.data.write().await = Arc::new(MasterData::default());
    }

    pub async fn available_flavours(&self, product_id: Option<i64>) -> Vec<Flavour> {
        self.snapshot()
            .await
            .available_flavours(product_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn available_add_ons(&self, product_id: Option<i64>) -> Vec<AddOn> {
        self.snapshot()
            .await
            .available_add_ons(product_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fetches products, flavours, add-ons and payment methods concurrently.
    ///
    /// Fails only when there is no valid session. A category that fails
    /// degrades on its own and is named in the report. Units and categories
    /// from an earlier [`MasterDataCache::load_expense_catalog`] are kept.
    pub async fn load(&self) -> ClientResult<LoadReport> {
        let token = self.session.access_token().await?;

        let (products, flavours, add_ons, payment_methods) = tokio::join!(
            self.fetch(MasterDataCategory::Products, &token),
            self.fetch(MasterDataCategory::Flavours, &token),
            self.fetch(MasterDataCategory::AddOns, &token),
            self.fetch(MasterDataCategory::PaymentMethods, &token),
        );

        let mut failures = Vec::new();
        let products = settle(products, MasterDataCategory::Products, &mut failures);
        let flavours = settle(flavours, MasterDataCategory::Flavours, &mut failures);
        let add_ons = settle(add_ons, MasterDataCategory::AddOns, &mut failures);
        let payment_methods = match payment_methods {
            Ok(items) => records(items, MasterDataCategory::PaymentMethods),
            Err(e) => {
                failures.push((MasterDataCategory::PaymentMethods, e));
                default_payment_methods()
            }
        };

        let mut guard = self.data.write().await;
        let next = Arc::new(MasterData {
            products,
            flavours,
            add_ons,
            payment_methods,
            units: guard.units.clone(),
            categories: guard.categories.clone(),
        });
        *guard = next.clone();
        drop(guard);

        info!(
            products = next.products.len(),
            flavours = next.flavours.len(),
            add_ons = next.add_ons.len(),
            payment_methods = next.payment_methods.len(),
            failed = failures.len(),
            "Master data loaded"
        );
        Ok(report(next, failures))
    }

    /// Fetches units and categories for the expense form.
    pub async fn load_expense_catalog(&self) -> ClientResult<LoadReport> {
        let token = self.session.access_token().await?;

        let (units, categories) = tokio::join!(
            self.fetch(MasterDataCategory::Units, &token),
            self.fetch(MasterDataCategory::Categories, &token),
        );

        let mut failures = Vec::new();
        let units = settle(units, MasterDataCategory::Units, &mut failures);
        let categories = settle(categories, MasterDataCategory::Categories, &mut failures);

        let mut guard = self.data.write().await;
        let mut next = (**guard).clone();
        next.units = units;
        next.categories = categories;
        let next = Arc::new(next);
        *guard = next.clone();
        drop(guard);

        info!(
            units = next.units.len(),
            categories = next.categories.len(),
            failed = failures.len(),
            "Expense catalog loaded"
        );
        Ok(report(next, failures))
    }

    async fn fetch(&self, category: MasterDataCategory, token: &str) -> ClientResult<Vec<Value>> {
        let response = self.http.get(category.path(), &[], Some(token)).await?;
        match decode_envelope::<Vec<Value>>(&response.body) {
            Envelope::Success(items) => Ok(items),
            Envelope::Failure { message } => Err(ClientError::MasterDataPartialFailure {
                category: category.label().to_string(),
                message: message.unwrap_or_else(|| format!("HTTP {}", response.status)),
            }),
        }
    }
}

impl fmt::Debug for MasterDataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterDataCache").finish_non_exhaustive()
    }
}

fn settle<T: FromWire>(
    result: ClientResult<Vec<Value>>,
    category: MasterDataCategory,
    failures: &mut Vec<(MasterDataCategory, ClientError)>,
) -> Vec<T> {
    match result {
        Ok(items) => records(items, category),
        Err(e) => {
            failures.push((category, e));
            Vec::new()
        }
    }
}

fn report(data: Arc<MasterData>, failures: Vec<(MasterDataCategory, ClientError)>) -> LoadReport {
    for (category, e) in &failures {
        warn!(category = %category, error = %e, "Master data category failed");
    }

    let failed = failures.iter().map(|(category, _)| *category).collect();
    let error = failures.into_iter().next().map(|(category, e)| match e {
        partial @ ClientError::MasterDataPartialFailure { .. } => partial,
        other => ClientError::MasterDataPartialFailure {
            category: category.label().to_string(),
            message: other.to_string(),
        },
    });

    LoadReport {
        data,
        error,
        failed,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{signed_in, FakeTransport};
    use crate::token_store::MemoryTokenStore;
    use serde_json::json;

    fn serve_sales_catalog(http: &FakeTransport) {
        http.respond_ok(
            "/products",
            json!([
                {"id": 1, "name": "Kulfi", "unitPrice": 20, "parcelPrice": "5.00",
                 "flavourIds": [4, "5"], "addOnIds": [{"id": 9}]},
                {"id": "2", "name": "Lassi", "price": 40.5},
                {"id": 0, "name": "Placeholder", "unitPrice": 1},
                {"name": "No id"},
            ]),
        );
        http.respond_ok(
            "/flavours",
            json!([
                {"id": 4, "name": "Mango", "price": 3},
                {"id": 5, "name": "Pista", "price": "4"},
                {"id": 6, "name": "Rose", "price": 2},
            ]),
        );
        http.respond_ok("/addons", json!([{"id": 9, "name": "Dry fruits", "price": 10}]));
        http.respond_ok(
            "/payment-methods",
            json!([{"id": 1, "name": "Cash"}, {"id": 2, "name": "UPI"}, {"id": null}]),
        );
    }

    #[tokio::test]
    async fn test_load_normalises_records() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);

        let report = cache.load().await.unwrap();
        assert!(report.is_complete());
        assert!(report.error.is_none());

        let data = report.data;
        assert_eq!(data.products.len(), 2);
        let kulfi = data.product(1).unwrap();
        assert_eq!(kulfi.unit_price, Money::from_cents(2000));
        assert_eq!(kulfi.parcel_price, Some(Money::from_cents(500)));
        assert_eq!(kulfi.flavour_ids, vec![4, 5]);
        assert_eq!(kulfi.add_on_ids, vec![9]);
        assert_eq!(data.product(2).unwrap().unit_price, Money::from_cents(4050));
        assert_eq!(data.payment_methods.len(), 2);

        // Every request carried the bearer token
        let requests = http.requests();
        assert!(requests
            .iter()
            .filter(|r| r.path != "/auth/login")
            .all(|r| r.bearer.is_some()));
    }

    #[tokio::test]
    async fn test_mistyped_fields_default_instead_of_dropping_entry() {
        let http = FakeTransport::new();
        http.respond_ok(
            "/products",
            json!([
                {"id": 1, "name": 123, "unitPrice": {"amount": 20}, "flavourIds": "4"},
                {"name": "No id"},
                42,
            ]),
        );
        http.respond_ok("/flavours", json!([{"id": 4, "name": ["Mango"], "price": true}]));
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);

        let data = cache.load().await.unwrap().data;
        assert_eq!(data.products.len(), 1);
        let product = data.product(1).unwrap();
        assert_eq!(product.name, "123");
        assert_eq!(product.unit_price, Money::zero());
        assert!(product.flavour_ids.is_empty());

        let flavour = data.flavour(4).unwrap();
        assert_eq!(flavour.name, "");
        assert_eq!(flavour.price, Money::zero());
    }

    #[tokio::test]
    async fn test_one_failed_category_degrades_alone() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        http.respond(
            "/flavours",
            500,
            json!({"status": "error", "message": "flavour table locked"}),
        );
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);

        let report = cache.load().await.unwrap();
        assert_eq!(report.failed, vec![MasterDataCategory::Flavours]);
        match report.error {
            Some(ClientError::MasterDataPartialFailure { category, message }) => {
                assert_eq!(category, "flavours");
                assert_eq!(message, "flavour table locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let data = cache.snapshot().await;
        assert!(data.flavours.is_empty());
        assert_eq!(data.products.len(), 2);
        assert_eq!(data.add_ons.len(), 1);
        assert_eq!(data.payment_methods.len(), 2);
    }

    #[tokio::test]
    async fn test_payment_methods_fall_back_to_defaults() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        http.fail_network("/payment-methods", "connection reset");
        http.respond_ok("/addons", json!({"not": "a list"}));
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);

        let report = cache.load().await.unwrap();
        assert_eq!(
            report.failed,
            vec![MasterDataCategory::AddOns, MasterDataCategory::PaymentMethods]
        );
        // First failure in category order is the one reported
        assert!(matches!(
            report.error,
            Some(ClientError::MasterDataPartialFailure { ref category, .. }) if category == "add-ons"
        ));
        assert_eq!(report.data.payment_methods, default_payment_methods());
    }

    #[tokio::test]
    async fn test_eligibility_lookups() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);
        cache.load().await.unwrap();

        let names: Vec<_> = cache
            .available_flavours(Some(1))
            .await
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["Mango", "Pista"]);
        assert_eq!(cache.available_add_ons(Some(1)).await.len(), 1);
        assert!(cache.available_flavours(Some(2)).await.is_empty());
        assert!(cache.available_flavours(Some(404)).await.is_empty());
        assert!(cache.available_add_ons(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_requires_a_session() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        let session = Arc::new(SessionManager::new(
            Arc::new(MemoryTokenStore::new()),
            http.clone(),
        ));
        let cache = MasterDataCache::new(http.clone(), session);

        assert!(matches!(
            cache.load().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_expense_catalog_survives_sales_reload() {
        let http = FakeTransport::new();
        serve_sales_catalog(&http);
        http.respond_ok("/units", json!([{"id": 1, "name": "kg"}, {"id": "2", "name": "litre"}]));
        http.respond("/categories", 200, json!({"status": "success"}));
        let cache = MasterDataCache::new(http.clone(), signed_in(http.clone()).await);

        let report = cache.load_expense_catalog().await.unwrap();
        assert_eq!(report.failed, vec![MasterDataCategory::Categories]);
        assert_eq!(report.data.units.len(), 2);

        cache.load().await.unwrap();
        let data = cache.snapshot().await;
        assert_eq!(data.units.len(), 2);
        assert_eq!(data.products.len(), 2);
    }

    #[test]
    fn test_wire_ids() {
        assert_eq!(wire_id(&json!(7)), Some(7));
        assert_eq!(wire_id(&json!(" 12 ")), Some(12));
        assert_eq!(wire_id(&json!(3.0)), Some(3));
        assert_eq!(wire_id(&json!({"id": "8"})), Some(8));
        assert_eq!(wire_id(&json!(0)), None);
        assert_eq!(wire_id(&json!("")), None);
        assert_eq!(wire_id(&json!(null)), None);
        assert_eq!(wire_id(&json!(false)), None);
        assert_eq!(wire_id(&json!(2.5)), None);
    }
}
