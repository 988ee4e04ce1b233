//! # Validation Module
//!
//! Input validation for ledger workflows.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input shape (THIS MODULE)                                    │
//! │  ├── ids, positive quantities, price rules, note length                │
//! │  └── runs before any lock or transaction                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger state (depot-db workflows, under the key lock)        │
//! │  ├── entity existence, availability, document status                   │
//! │  └── Stock Mutator non-negativity                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), CHECK (reserved_qty <= quantity)           │
//! │  └── UNIQUE codes, UNIQUE opname per (warehouse, product, date)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use depot_core::quantity::Quantity;
//! use depot_core::validation::{validate_positive_quantity, validate_uuid};
//!
//! validate_uuid("warehouse_id", "550e8400-e29b-41d4-a716-446655440000").unwrap();
//! assert!(validate_positive_quantity("quantity", Quantity::ZERO).is_err());
//! ```

use chrono::NaiveDate;

use crate::documents::{
    check_receipt_split, CreateOpnameInput, InboundInput, OutboundInput, ReceiveMutationInput,
    SendMutationInput,
};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::{MAX_ATTACHMENT_LEN, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted actor identifier.
pub const MAX_ACTOR_LEN: usize = 100;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity id (UUID string).
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates the acting user id recorded on documents and history entries.
pub fn validate_actor(actor: &str) -> ValidationResult<()> {
    let actor = actor.trim();

    if actor.is_empty() {
        return Err(ValidationError::Required {
            field: "actor".to_string(),
        });
    }

    if actor.len() > MAX_ACTOR_LEN {
        return Err(ValidationError::TooLong {
            field: "actor".to_string(),
            max: MAX_ACTOR_LEN,
        });
    }

    Ok(())
}

/// Quantity must be strictly greater than zero.
pub fn validate_positive_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Quantity must be zero or more.
pub fn validate_non_negative_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if qty.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Inbound prices may be zero (free goods, samples).
pub fn validate_inbound_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

/// Sales must carry a price.
pub fn validate_sale_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

/// `unit_price × quantity`, or `OutOfRange` when the total overflows cents.
pub fn sale_total(unit_price: Money, quantity: Quantity) -> ValidationResult<Money> {
    unit_price
        .times(quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total_price".to_string(),
            min: 0,
            max: i64::MAX,
        })
}

pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    validate_optional_text("notes", notes, MAX_NOTES_LEN)
}

pub fn validate_attachment(attachment: Option<&str>) -> ValidationResult<()> {
    validate_optional_text("attachment", attachment, MAX_ATTACHMENT_LEN)
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Parses a `YYYY-MM-DD` document date.
///
/// ## Example
/// ```rust
/// use depot_core::validation::parse_date;
///
/// assert!(parse_date("sale_date", "2026-01-05").is_ok());
/// assert!(parse_date("sale_date", "05/01/2026").is_err());
/// ```
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })
}

/// Validates a document code prefix (`IN`, `OUT`, ...).
///
/// ## Rules
/// - 1 to 8 characters
/// - Uppercase ASCII letters only
pub fn validate_code_prefix(field: &str, prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if prefix.len() > 8 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 8,
        });
    }

    if !prefix.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only uppercase letters".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Workflow Input Validators
// =============================================================================

pub fn validate_inbound(input: &InboundInput) -> CoreResult<()> {
    validate_uuid("supplier_id", &input.supplier_id)?;
    validate_uuid("warehouse_id", &input.warehouse_id)?;
    validate_uuid("product_id", &input.product_id)?;
    validate_positive_quantity("quantity", input.quantity)?;
    validate_inbound_price(input.unit_price)?;
    validate_notes(input.notes.as_deref())?;
    Ok(())
}

pub fn validate_outbound(input: &OutboundInput) -> CoreResult<()> {
    validate_uuid("customer_id", &input.customer_id)?;
    validate_uuid("warehouse_id", &input.warehouse_id)?;
    validate_uuid("product_id", &input.product_id)?;
    validate_positive_quantity("quantity", input.quantity)?;
    validate_sale_price(input.unit_price)?;
    validate_notes(input.notes.as_deref())?;
    validate_attachment(input.attachment.as_deref())?;
    Ok(())
}

/// Also rejects a transfer from a warehouse to itself.
pub fn validate_send_mutation(input: &SendMutationInput) -> CoreResult<()> {
    validate_uuid("from_warehouse_id", &input.from_warehouse_id)?;
    validate_uuid("to_warehouse_id", &input.to_warehouse_id)?;
    validate_uuid("product_id", &input.product_id)?;
    validate_positive_quantity("quantity", input.quantity)?;
    validate_notes(input.notes.as_deref())?;

    if input.from_warehouse_id == input.to_warehouse_id {
        return Err(CoreError::SameWarehouse);
    }
    Ok(())
}

/// Shape checks only; the split against the sent quantity needs the stored
/// mutation, see [`validate_receipt_against`].
pub fn validate_receive_mutation(input: &ReceiveMutationInput) -> CoreResult<()> {
    validate_uuid("mutation_id", &input.mutation_id)?;
    validate_non_negative_quantity("received_qty", input.received_qty)?;
    validate_non_negative_quantity("damaged_qty", input.damaged_qty)?;
    Ok(())
}

/// `received + damaged <= sent`
pub fn validate_receipt_against(input: &ReceiveMutationInput, sent: Quantity) -> CoreResult<()> {
    check_receipt_split(sent, input.received_qty, input.damaged_qty)
}

pub fn validate_create_opname(input: &CreateOpnameInput) -> CoreResult<()> {
    validate_uuid("warehouse_id", &input.warehouse_id)?;
    validate_uuid("product_id", &input.product_id)?;
    validate_non_negative_quantity("physical_qty", input.physical_qty)?;
    validate_notes(input.notes.as_deref())?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const WH_A: &str = "0b5e8f4c-3d9a-4b8e-9d1f-6a2c7e4b1a01";
    const WH_B: &str = "0b5e8f4c-3d9a-4b8e-9d1f-6a2c7e4b1a02";
    const PRODUCT: &str = "7f3a2b1c-9e8d-4c7b-a6f5-e4d3c2b1a001";

    fn send(from: &str, to: &str, qty: i64) -> SendMutationInput {
        SendMutationInput {
            from_warehouse_id: from.to_string(),
            to_warehouse_id: to.to_string(),
            product_id: PRODUCT.to_string(),
            quantity: Quantity::from_units(qty),
            notes: None,
        }
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", WH_A).is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_quantity_rules() {
        assert!(validate_positive_quantity("quantity", Quantity::from_milli(1)).is_ok());
        assert!(validate_positive_quantity("quantity", Quantity::ZERO).is_err());
        assert!(validate_non_negative_quantity("damaged_qty", Quantity::ZERO).is_ok());
        assert!(validate_non_negative_quantity("damaged_qty", Quantity::from_units(-1)).is_err());
    }

    #[test]
    fn test_price_rules() {
        assert!(validate_inbound_price(Money::zero()).is_ok());
        assert!(validate_inbound_price(Money::from_cents(-1)).is_err());
        assert!(validate_sale_price(Money::zero()).is_err());
        assert!(validate_sale_price(Money::from_cents(1)).is_ok());
    }

    #[test]
    fn test_sale_total_overflow() {
        let total = sale_total(Money::from_cents(1_500), Quantity::from_units(4)).unwrap();
        assert_eq!(total, Money::from_cents(6_000));

        let err = sale_total(
            Money::from_cents(10_000_000_000_000),
            Quantity::from_units(10_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "total_price"));
    }

    #[test]
    fn test_send_to_same_warehouse() {
        assert!(validate_send_mutation(&send(WH_A, WH_B, 30)).is_ok());
        assert!(matches!(
            validate_send_mutation(&send(WH_A, WH_A, 30)),
            Err(CoreError::SameWarehouse)
        ));
        assert!(matches!(
            validate_send_mutation(&send(WH_A, WH_B, 0)),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[test]
    fn test_receipt_split_against_sent() {
        let input = ReceiveMutationInput {
            mutation_id: WH_A.to_string(),
            received_qty: Quantity::from_units(29),
            damaged_qty: Quantity::from_units(2),
        };
        assert!(validate_receive_mutation(&input).is_ok());
        assert!(matches!(
            validate_receipt_against(&input, Quantity::from_units(30)),
            Err(CoreError::OverReceipt { .. })
        ));
        assert!(validate_receipt_against(&input, Quantity::from_units(31)).is_ok());
    }

    #[test]
    fn test_notes_length() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("damaged carton")).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_code_prefix() {
        assert!(validate_code_prefix("inbound", "IN").is_ok());
        assert!(validate_code_prefix("inbound", "").is_err());
        assert!(validate_code_prefix("inbound", "in").is_err());
        assert!(validate_code_prefix("inbound", "RECEIVING").is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("opname_date", "2026-01-05").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert!(parse_date("opname_date", "2026-02-30").is_err());
    }
}
