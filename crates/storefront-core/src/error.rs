//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── CoreError        - Catalog / draft rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-store errors (separate crate)                              │
//! │  └── DbError          - Key/value storage failures                     │
//! │                                                                         │
//! │  storefront-client errors                                              │
//! │  └── ClientError      - What the UI shell sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → user alert          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id not present in the loaded master data.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Draft line key does not exist (already removed).
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Draft has reached its line limit.
    #[error("Order cannot have more than {max} lines")]
    DraftTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Draft Fields
// =============================================================================

/// A required input on a sale line or expense form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    Product,
    Item,
    Quantity,
    Amount,
    Category,
    PaymentMethod,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Product => "product",
            DraftField::Item => "item",
            DraftField::Quantity => "quantity",
            DraftField::Amount => "amount",
            DraftField::Category => "category",
            DraftField::PaymentMethod => "payment method",
        };
        f.write_str(name)
    }
}

/// One missing field, optionally tied to a 1-based line number.
///
/// `line` is `None` for draft-level fields such as the payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingField {
    pub line: Option<usize>,
    pub field: DraftField,
}

impl MissingField {
    pub fn on_line(line: usize, field: DraftField) -> Self {
        MissingField {
            line: Some(line),
            field,
        }
    }

    pub fn draft(field: DraftField) -> Self {
        MissingField { line: None, field }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

fn join_missing(missing: &[MissingField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any network call is made; a draft that fails
/// validation never reaches the submission endpoint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., an amount with three decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// One or more required draft fields are empty.
    ///
    /// ## User Workflow
    /// ```text
    /// Line 1: Kulfi × 2      ✓
    /// Line 2: Falooda × ?    ✗ quantity
    /// Payment: (none)        ✗ payment method
    ///      │
    ///      ▼
    /// IncompleteDraft { missing: [line 2: quantity, payment method] }
    ///      │
    ///      ▼
    /// UI highlights both fields, submit button stays blocked
    /// ```
    #[error("Missing required fields: {}", join_missing(.missing))]
    IncompleteDraft { missing: Vec<MissingField> },
}

impl ValidationError {
    /// Returns the missing fields if this is an incomplete-draft error.
    pub fn missing_fields(&self) -> &[MissingField] {
        match self {
            ValidationError::IncompleteDraft { missing } => missing,
            _ => &[],
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ProductNotFound(42);
        assert_eq!(err.to_string(), "Product not found: 42");

        let err = CoreError::DraftTooLarge { max: 50 };
        assert_eq!(err.to_string(), "Order cannot have more than 50 lines");
    }

    #[test]
    fn test_incomplete_draft_message_lists_lines() {
        let err = ValidationError::IncompleteDraft {
            missing: vec![
                MissingField::on_line(2, DraftField::Quantity),
                MissingField::draft(DraftField::PaymentMethod),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Missing required fields: line 2: quantity; payment method"
        );
        assert_eq!(err.missing_fields().len(), 2);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
