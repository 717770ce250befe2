//! # Pricing Engine
//!
//! Line amounts and order totals for draft sales.
//!
//! ## Line Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_per_unit = product.unit_price                                    │
//! │                 + flavour.price          (if a flavour is chosen)       │
//! │                 + add_on.price           (if an add-on is chosen)       │
//! │                 + product.parcel_price   (if packed for takeaway)       │
//! │                                                                         │
//! │  amount = quantity × price_per_unit                                     │
//! │                                                                         │
//! │  Example: Kulfi 20 + Mango 3 + parcel 5 = 28 per unit, × 2 = 56.00      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amount Precedence
//! ```text
//! custom price (user typed it)      ── always wins
//!        │ no
//!        ▼
//! server-confirmed for this revision ── wins while the line is unchanged
//!        │ none / stale
//!        ▼
//! client computation (this module)  ── offline fallback
//! ```
//!
//! Amounts are integer minor units, so every result is already rounded to
//! two decimal places.

use crate::catalog::MasterData;
use crate::money::Money;
use crate::types::{AddOn, AmountSource, Flavour, LineItem, Product};

/// Price of one unit with the chosen surcharges.
pub fn price_per_unit(
    product: &Product,
    flavour: Option<&Flavour>,
    add_on: Option<&AddOn>,
    is_parcel: bool,
) -> Money {
    let mut price = product.unit_price;
    if let Some(flavour) = flavour {
        price += flavour.price;
    }
    if let Some(add_on) = add_on {
        price += add_on.price;
    }
    if is_parcel {
        price += product.parcel_price.unwrap_or_default();
    }
    price
}

/// Computes the total for one line.
///
/// Returns zero, not an error, while the form lacks a product or a positive
/// quantity.
///
/// ## Example
/// ```rust
/// use storefront_core::pricing::compute_line_amount;
/// use storefront_core::{Money, Product};
///
/// let lassi = Product::new(2, "Lassi", Money::from_cents(4000));
/// assert_eq!(compute_line_amount(Some(&lassi), None, None, false, Some(3)).cents(), 12000);
/// assert_eq!(compute_line_amount(None, None, None, false, Some(3)), Money::zero());
/// assert_eq!(compute_line_amount(Some(&lassi), None, None, false, Some(0)), Money::zero());
/// ```
pub fn compute_line_amount(
    product: Option<&Product>,
    flavour: Option<&Flavour>,
    add_on: Option<&AddOn>,
    is_parcel: bool,
    quantity: Option<i64>,
) -> Money {
    match (product, quantity) {
        (Some(product), Some(qty)) if qty > 0 => {
            price_per_unit(product, flavour, add_on, is_parcel).multiply_quantity(qty)
        }
        _ => Money::zero(),
    }
}

/// Sums each line's current amount (the user's sale price on custom lines).
///
/// Partially filled lines count as zero.
pub fn compute_order_total(lines: &[LineItem]) -> Money {
    lines.iter().map(LineItem::effective_amount).sum()
}

/// Recomputes `sale_price`/`amount` for a line from the catalog.
///
/// Custom-price lines keep the user's `sale_price`; `amount` mirrors it.
/// A flavour or add-on the product does not allow is cleared.
pub fn reprice_line(line: &mut LineItem, catalog: &MasterData) {
    if line.is_custom_price {
        line.amount = line.sale_price;
        line.amount_source = if line.sale_price.is_some() {
            AmountSource::Custom
        } else {
            AmountSource::Unset
        };
        return;
    }

    let product = line.product_id.and_then(|id| catalog.product(id));

    if let Some(product) = product {
        if line.flavour_id.is_some_and(|id| !product.allows_flavour(id)) {
            line.flavour_id = None;
        }
        if line.add_on_id.is_some_and(|id| !product.allows_add_on(id)) {
            line.add_on_id = None;
        }
    }

    let flavour = line.flavour_id.and_then(|id| catalog.flavour(id));
    let add_on = line.add_on_id.and_then(|id| catalog.add_on(id));

    match (product, line.quantity) {
        (Some(product), Some(qty)) if qty > 0 => {
            let unit = price_per_unit(product, flavour, add_on, line.is_parcel);
            line.sale_price = Some(unit);
            line.amount = Some(unit.multiply_quantity(qty));
            line.amount_source = AmountSource::Client;
        }
        _ => {
            line.sale_price = None;
            line.amount = None;
            line.amount_source = AmountSource::Unset;
        }
    }
}

/// Applies a server-confirmed amount if it was computed for the line's
/// current revision.
///
/// Returns `false` (and leaves the line untouched) for stale revisions and
/// custom-price lines.
pub fn apply_confirmed_amount(line: &mut LineItem, revision: u64, amount: Money) -> bool {
    if line.revision != revision || line.is_custom_price {
        return false;
    }
    line.amount = Some(amount);
    if let Some(qty) = line.quantity.filter(|q| *q > 0) {
        line.sale_price = Some(Money::from_cents(amount.cents() / qty));
    }
    line.amount_source = AmountSource::Server;
    true
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DraftOrder;

    fn kulfi() -> Product {
        Product::new(1, "Kulfi", Money::from_cents(2000))
            .with_parcel_price(Money::from_cents(500))
            .with_flavours([4])
            .with_add_ons([9])
    }

    fn mango() -> Flavour {
        Flavour::new(4, "Mango", Money::from_cents(300))
    }

    fn dry_fruits() -> AddOn {
        AddOn::new(9, "Dry fruits", Money::from_cents(1000))
    }

    fn catalog() -> MasterData {
        MasterData::default()
            .with_products(vec![kulfi()])
            .with_flavours(vec![mango()])
            .with_add_ons(vec![dry_fruits()])
    }

    #[test]
    fn test_parcel_flavour_scenario() {
        // (20 + 3 + 5) × 2 = 56.00
        let amount = compute_line_amount(Some(&kulfi()), Some(&mango()), None, true, Some(2));
        assert_eq!(amount, Money::from_cents(5600));
    }

    #[test]
    fn test_all_surcharges() {
        let amount = compute_line_amount(
            Some(&kulfi()),
            Some(&mango()),
            Some(&dry_fruits()),
            true,
            Some(1),
        );
        assert_eq!(amount.cents(), 2000 + 300 + 1000 + 500);
    }

    #[test]
    fn test_parcel_without_parcel_price_adds_nothing() {
        let plain = Product::new(2, "Lassi", Money::from_cents(4000));
        let amount = compute_line_amount(Some(&plain), None, None, true, Some(1));
        assert_eq!(amount.cents(), 4000);
    }

    #[test]
    fn test_line_amount_is_linear_in_quantity() {
        let p = kulfi();
        let f = mango();
        let a = dry_fruits();
        for parcel in [false, true] {
            for q in [1, 2, 7, 13, 500] {
                let single = compute_line_amount(Some(&p), Some(&f), Some(&a), parcel, Some(q));
                let double = compute_line_amount(Some(&p), Some(&f), Some(&a), parcel, Some(2 * q));
                assert_eq!(double, single * 2);
            }
        }
    }

    #[test]
    fn test_missing_inputs_yield_zero() {
        assert_eq!(compute_line_amount(None, Some(&mango()), None, true, Some(2)), Money::zero());
        assert_eq!(compute_line_amount(Some(&kulfi()), None, None, false, None), Money::zero());
        assert_eq!(compute_line_amount(Some(&kulfi()), None, None, false, Some(-3)), Money::zero());
    }

    #[test]
    fn test_order_total_of_empty_list_is_zero() {
        assert_eq!(compute_order_total(&[]), Money::zero());
    }

    #[test]
    fn test_order_total_tolerates_partial_lines_and_custom_prices() {
        let catalog = catalog();
        let mut draft = DraftOrder::new();
        let first = draft.lines[0].key.clone();
        draft
            .update_line(&first, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(2);
            })
            .unwrap();

        // Half-filled line: product but no quantity
        let second = draft.add_line().unwrap();
        draft
            .update_line(&second, &catalog, |l| l.product_id = Some(1))
            .unwrap();

        // Custom price line
        let third = draft.add_line().unwrap();
        draft
            .update_line(&third, &catalog, |l| {
                l.product_id = Some(1);
                l.quantity = Some(3);
                l.is_custom_price = true;
                l.sale_price = Some(Money::from_cents(5000));
            })
            .unwrap();

        assert_eq!(compute_order_total(&draft.lines), Money::from_cents(4000 + 5000));
    }

    #[test]
    fn test_custom_price_is_not_overwritten() {
        let catalog = catalog();
        let mut line = LineItem::blank();
        line.product_id = Some(1);
        line.quantity = Some(2);
        line.is_custom_price = true;
        line.sale_price = Some(Money::from_cents(999));

        reprice_line(&mut line, &catalog);
        assert_eq!(line.sale_price, Some(Money::from_cents(999)));
        assert_eq!(line.amount, Some(Money::from_cents(999)));
        assert_eq!(line.amount_source, AmountSource::Custom);
    }

    #[test]
    fn test_reprice_clears_ineligible_flavour() {
        let catalog = catalog().with_flavours(vec![
            mango(),
            Flavour::new(5, "Pista", Money::from_cents(400)),
        ]);
        let mut line = LineItem::blank();
        line.product_id = Some(1);
        line.flavour_id = Some(5);
        line.quantity = Some(1);

        reprice_line(&mut line, &catalog);
        assert_eq!(line.flavour_id, None);
        assert_eq!(line.amount, Some(Money::from_cents(2000)));
    }

    #[test]
    fn test_confirmed_amount_respects_revision() {
        let catalog = catalog();
        let mut line = LineItem::blank();
        line.product_id = Some(1);
        line.quantity = Some(2);
        line.revision = 3;
        reprice_line(&mut line, &catalog);

        assert!(!apply_confirmed_amount(&mut line, 2, Money::from_cents(1)));
        assert_eq!(line.amount, Some(Money::from_cents(4000)));

        assert!(apply_confirmed_amount(&mut line, 3, Money::from_cents(3800)));
        assert_eq!(line.amount, Some(Money::from_cents(3800)));
        assert_eq!(line.sale_price, Some(Money::from_cents(1900)));
        assert_eq!(line.amount_source, AmountSource::Server);
    }
}
