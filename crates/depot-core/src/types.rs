//! # Domain Types
//!
//! Catalog entities, stock lines and the history ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ledger Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   Warehouse     │   │   StockLevel    │   │ StockHistoryEntry   │   │
//! │  │   Product       │──►│  ─────────────  │──►│  ─────────────────  │   │
//! │  │  (catalog)      │   │  quantity       │   │  previous_qty       │   │
//! │  └─────────────────┘   │  reserved_qty   │   │  new_qty            │   │
//! │                        │  version        │   │  change_qty         │   │
//! │  ┌─────────────────┐   └─────────────────┘   │  reference_type/id  │   │
//! │  │ Supplier        │                         └─────────────────────┘   │
//! │  │ Customer        │   StockLevel: one row per (warehouse, product),   │
//! │  └─────────────────┘   created on first movement, never deleted.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity uses a UUID v4 string `id`; documents also carry a
//! human-readable code (see [`crate::code`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::quantity::Quantity;

// =============================================================================
// Catalog
// =============================================================================

/// A physical stock location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    /// Short business code, e.g. `JKT-01`.
    pub code: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    /// Unit of measure label (`pcs`, `kg`, `box`).
    pub unit: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Source of inbound receipts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Destination of outbound sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Key
// =============================================================================

/// Identifies one stock line: a product inside a warehouse.
///
/// Ordered so lock acquisition over several keys always happens in the same
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: String,
    pub product_id: String,
}

impl StockKey {
    pub fn new(warehouse_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        StockKey {
            warehouse_id: warehouse_id.into(),
            product_id: product_id.into(),
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.warehouse_id, self.product_id)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Current on-hand and reserved quantity for one stock line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub id: String,
    pub warehouse_id: String,
    pub product_id: String,
    /// On-hand quantity, never negative.
    pub quantity: Quantity,
    /// Quantity promised but not yet taken, `0 <= reserved_qty <= quantity`.
    pub reserved_qty: Quantity,
    /// Number of history entries written for this line.
    pub version: i64,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl StockLevel {
    /// Quantity eligible for new outbound commitments.
    #[inline]
    pub fn available(&self) -> Quantity {
        self.quantity - self.reserved_qty
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(&self.warehouse_id, &self.product_id)
    }
}

// =============================================================================
// Availability
// =============================================================================

/// Answer to "how much can be taken from this stock line".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Availability {
    pub quantity: Quantity,
    pub reserved: Quantity,
    pub available: Quantity,
    /// True when anything at all can be taken.
    pub is_available: bool,
}

impl Availability {
    /// Builds availability from a stock line; a missing line is empty stock.
    pub fn from_level(level: Option<&StockLevel>) -> Self {
        match level {
            Some(level) => Availability::new(level.quantity, level.reserved_qty),
            None => Availability::new(Quantity::ZERO, Quantity::ZERO),
        }
    }

    pub fn new(quantity: Quantity, reserved: Quantity) -> Self {
        let available = quantity - reserved;
        Availability {
            quantity,
            reserved,
            available,
            is_available: available.is_positive(),
        }
    }

    /// Whether `requested` units can be taken.
    #[inline]
    pub fn covers(&self, requested: Quantity) -> bool {
        self.available >= requested
    }
}

// =============================================================================
// History Ledger
// =============================================================================

/// The document type that caused a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Inbound,
    Outbound,
    MutationSent,
    MutationReceived,
    Opname,
    /// Manual corrections recorded by external tooling.
    Adjustment,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Inbound => "inbound",
            ReferenceType::Outbound => "outbound",
            ReferenceType::MutationSent => "mutation_sent",
            ReferenceType::MutationReceived => "mutation_received",
            ReferenceType::Opname => "opname",
            ReferenceType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-reference from a history entry to its causing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceType,
    pub id: String,
    pub code: String,
}

impl Reference {
    pub fn new(kind: ReferenceType, id: impl Into<String>, code: impl Into<String>) -> Self {
        Reference {
            kind,
            id: id.into(),
            code: code.into(),
        }
    }
}

/// One immutable record of a quantity change.
///
/// Invariant: `change_qty == new_qty - previous_qty`, and replaying every
/// entry of a stock line in `entry_seq` order from zero yields the line's
/// current quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockHistoryEntry {
    pub id: String,
    pub stock_level_id: String,
    /// 1-based position within the stock line's history.
    pub entry_seq: i64,
    pub warehouse_id: String,
    pub product_id: String,
    pub previous_qty: Quantity,
    pub new_qty: Quantity,
    pub change_qty: Quantity,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub reference_code: String,
    pub notes: Option<String>,
    pub actor: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn level(quantity: i64, reserved: i64) -> StockLevel {
        StockLevel {
            id: "sl-1".to_string(),
            warehouse_id: "wh-a".to_string(),
            product_id: "p-1".to_string(),
            quantity: Quantity::from_units(quantity),
            reserved_qty: Quantity::from_units(reserved),
            version: 0,
            last_updated: Utc::now(),
            updated_by: None,
        }
    }

    #[test]
    fn test_availability_subtracts_reserved() {
        let availability = Availability::from_level(Some(&level(10, 4)));
        assert_eq!(availability.available, Quantity::from_units(6));
        assert!(availability.is_available);
        assert!(availability.covers(Quantity::from_units(6)));
        assert!(!availability.covers(Quantity::from_units(7)));
    }

    #[test]
    fn test_missing_line_is_empty() {
        let availability = Availability::from_level(None);
        assert!(availability.available.is_zero());
        assert!(!availability.is_available);
    }

    #[test]
    fn test_fully_reserved_is_unavailable() {
        let availability = Availability::from_level(Some(&level(5, 5)));
        assert!(!availability.is_available);
    }

    #[test]
    fn test_stock_key_ordering() {
        let mut keys = vec![StockKey::new("wh-b", "p-1"), StockKey::new("wh-a", "p-2")];
        keys.sort();
        assert_eq!(keys[0].warehouse_id, "wh-a");
        assert_eq!(keys[0].to_string(), "wh-a/p-2");
    }

    #[test]
    fn test_reference_type_serde() {
        let json = serde_json::to_string(&ReferenceType::MutationReceived).unwrap();
        assert_eq!(json, "\"mutation_received\"");
        assert_eq!(ReferenceType::MutationSent.to_string(), "mutation_sent");
    }
}
