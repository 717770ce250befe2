//! # Master Data Catalog
//!
//! Immutable snapshot of the reference catalog fetched once per session.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MasterData                                                             │
//! │                                                                         │
//! │  products ─────────┐                                                    │
//! │  flavours ─────────┼──► available_flavours(product_id)                 │
//! │  add_ons ──────────┼──► available_add_ons(product_id)                  │
//! │  payment_methods   │     (subset whose id is in the product's          │
//! │  units, categories │      eligibility list)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fetching side lives in `storefront-client`; this module never does I/O.

use serde::{Deserialize, Serialize};

use crate::types::{AddOn, Category, Flavour, PaymentMethodOption, Product, Unit};

/// Payment methods used when the payment-methods endpoint fails.
///
/// The single place this fallback is defined.
pub const DEFAULT_PAYMENT_METHODS: &[(i64, &str)] = &[(1, "Cash"), (2, "UPI")];

/// Returns [`DEFAULT_PAYMENT_METHODS`] as catalog entries.
pub fn default_payment_methods() -> Vec<PaymentMethodOption> {
    DEFAULT_PAYMENT_METHODS
        .iter()
        .map(|(id, name)| PaymentMethodOption {
            id: *id,
            name: (*name).to_string(),
        })
        .collect()
}

/// In-memory snapshot of products, flavours, add-ons, payment methods and
/// the expense catalog (units, categories).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterData {
    pub products: Vec<Product>,
    pub flavours: Vec<Flavour>,
    pub add_ons: Vec<AddOn>,
    pub payment_methods: Vec<PaymentMethodOption>,
    pub units: Vec<Unit>,
    pub categories: Vec<Category>,
}

impl MasterData {
    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_flavours(mut self, flavours: Vec<Flavour>) -> Self {
        self.flavours = flavours;
        self
    }

    pub fn with_add_ons(mut self, add_ons: Vec<AddOn>) -> Self {
        self.add_ons = add_ons;
        self
    }

    pub fn with_payment_methods(mut self, methods: Vec<PaymentMethodOption>) -> Self {
        self.payment_methods = methods;
        self
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn flavour(&self, id: i64) -> Option<&Flavour> {
        self.flavours.iter().find(|f| f.id == id)
    }

    pub fn add_on(&self, id: i64) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.id == id)
    }

    pub fn unit(&self, id: i64) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Flavours selectable for `product_id`.
    ///
    /// Empty when the id is missing or zero, or the product is unknown.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::{Flavour, MasterData, Money, Product};
    ///
    /// let catalog = MasterData::default()
    ///     .with_products(vec![Product::new(1, "Kulfi", Money::from_cents(2000)).with_flavours([4])])
    ///     .with_flavours(vec![
    ///         Flavour::new(4, "Mango", Money::from_cents(300)),
    ///         Flavour::new(5, "Pista", Money::from_cents(400)),
    ///     ]);
    ///
    /// let names: Vec<_> = catalog.available_flavours(Some(1)).iter().map(|f| f.name.as_str()).collect();
    /// assert_eq!(names, ["Mango"]);
    /// assert!(catalog.available_flavours(None).is_empty());
    /// ```
    pub fn available_flavours(&self, product_id: Option<i64>) -> Vec<&Flavour> {
        match self.eligible_product(product_id) {
            Some(product) => self
                .flavours
                .iter()
                .filter(|f| product.allows_flavour(f.id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Add-ons selectable for `product_id`. Same rules as
    /// [`MasterData::available_flavours`].
    pub fn available_add_ons(&self, product_id: Option<i64>) -> Vec<&AddOn> {
        match self.eligible_product(product_id) {
            Some(product) => self
                .add_ons
                .iter()
                .filter(|a| product.allows_add_on(a.id))
                .collect(),
            None => Vec::new(),
        }
    }

    fn eligible_product(&self, product_id: Option<i64>) -> Option<&Product> {
        product_id.filter(|id| *id != 0).and_then(|id| self.product(id))
    }

    /// Returns true when nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.flavours.is_empty()
            && self.add_ons.is_empty()
            && self.payment_methods.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn catalog() -> MasterData {
        MasterData::default()
            .with_products(vec![
                Product::new(1, "Kulfi", Money::from_cents(2000))
                    .with_flavours([4, 6])
                    .with_add_ons([9]),
                Product::new(2, "Lassi", Money::from_cents(4000)),
            ])
            .with_flavours(vec![
                Flavour::new(4, "Mango", Money::from_cents(300)),
                Flavour::new(5, "Pista", Money::from_cents(400)),
                Flavour::new(6, "Rose", Money::from_cents(250)),
            ])
            .with_add_ons(vec![
                AddOn::new(9, "Dry fruits", Money::from_cents(1000)),
                AddOn::new(10, "Cream", Money::from_cents(500)),
            ])
    }

    #[test]
    fn test_available_flavours_filters_by_eligibility() {
        let catalog = catalog();
        let ids: Vec<i64> = catalog
            .available_flavours(Some(1))
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![4, 6]);

        // Product with no eligible flavours
        assert!(catalog.available_flavours(Some(2)).is_empty());
    }

    #[test]
    fn test_available_add_ons() {
        let catalog = catalog();
        let ids: Vec<i64> = catalog
            .available_add_ons(Some(1))
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn test_lookups_with_missing_product() {
        let catalog = catalog();
        assert!(catalog.available_flavours(None).is_empty());
        assert!(catalog.available_flavours(Some(0)).is_empty());
        assert!(catalog.available_flavours(Some(99)).is_empty());
        assert!(catalog.available_add_ons(Some(99)).is_empty());
    }

    #[test]
    fn test_default_payment_methods() {
        let methods = default_payment_methods();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name, "Cash");
        assert_eq!(methods[1].name, "UPI");
    }
}
