//! # Validation Module
//!
//! Checks a draft before it is allowed anywhere near the network.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                     │
//! │  └── Disables submit while fields are empty                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Collects EVERY missing field on EVERY line in one pass            │
//! │  └── Range checks (quantity limit, negative custom prices)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: REST API                                                     │
//! │  └── Server-side rules; rejections come back as SubmissionError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::validate_order;
//! use storefront_core::{DraftField, DraftOrder};
//!
//! let draft = DraftOrder::new();
//! let err = validate_order(&draft).unwrap_err();
//! assert!(err.missing_fields().iter().any(|m| m.field == DraftField::PaymentMethod));
//! ```

use crate::error::{DraftField, MissingField, ValidationError};
use crate::money::Money;
use crate::types::{DraftOrder, ExpenseDraft, LineItem};
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Draft Validators
// =============================================================================

/// Validates a sale draft.
///
/// ## Rules
/// - Every line needs a product, a positive quantity and an amount
/// - The draft needs a payment mode
/// - Quantities may not exceed [`MAX_LINE_QUANTITY`]
/// - Custom prices may not be negative
pub fn validate_order(draft: &DraftOrder) -> ValidationResult<()> {
    let mut missing = Vec::new();

    for (index, line) in draft.lines.iter().enumerate() {
        let number = index + 1;
        if line.product_id.is_none() {
            missing.push(MissingField::on_line(number, DraftField::Product));
        }
        if !line.quantity.is_some_and(|q| q > 0) {
            missing.push(MissingField::on_line(number, DraftField::Quantity));
        }
        if line_amount(line).is_none() {
            missing.push(MissingField::on_line(number, DraftField::Amount));
        }
    }
    if draft.payment_mode.is_none() {
        missing.push(MissingField::draft(DraftField::PaymentMethod));
    }

    if !missing.is_empty() {
        return Err(ValidationError::IncompleteDraft { missing });
    }

    for line in &draft.lines {
        if let Some(qty) = line.quantity {
            validate_quantity(qty)?;
        }
        if let Some(amount) = line_amount(line) {
            validate_amount(amount)?;
        }
    }

    Ok(())
}

/// Validates an expense draft.
///
/// ## Rules
/// - Item name, category, positive quantity, amount and payment mode are
///   all required
/// - The amount may not be negative
pub fn validate_expense(draft: &ExpenseDraft) -> ValidationResult<()> {
    let mut missing = Vec::new();

    if draft.item.trim().is_empty() {
        missing.push(MissingField::draft(DraftField::Item));
    }
    if !draft.quantity.is_some_and(|q| q > 0) {
        missing.push(MissingField::draft(DraftField::Quantity));
    }
    if draft.amount.is_none() {
        missing.push(MissingField::draft(DraftField::Amount));
    }
    if draft.category_id.is_none() {
        missing.push(MissingField::draft(DraftField::Category));
    }
    if draft.payment_mode.is_none() {
        missing.push(MissingField::draft(DraftField::PaymentMethod));
    }

    if !missing.is_empty() {
        return Err(ValidationError::IncompleteDraft { missing });
    }

    if let Some(qty) = draft.quantity {
        validate_quantity(qty)?;
    }
    if let Some(amount) = draft.amount {
        validate_amount(amount)?;
    }

    Ok(())
}

fn line_amount(line: &LineItem) -> Option<Money> {
    if line.is_custom_price {
        line.sale_price
    } else {
        line.amount
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount. Zero is allowed (complimentary items).
pub fn validate_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates sign-in credentials before they are sent.
pub fn validate_credentials(username: &str, password: &str) -> ValidationResult<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
