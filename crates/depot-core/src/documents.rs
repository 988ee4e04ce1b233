//! # Ledger Documents
//!
//! The four document types that cause stock movements, plus the inputs the
//! caller submits for each.
//!
//! ## Document Lifecycles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InboundReceipt   created ──► +quantity at warehouse   (one entry)     │
//! │  OutboundSale     created ──► −quantity at warehouse   (one entry)     │
//! │                                                                         │
//! │  StockMutation                                                          │
//! │     ┌──────┐  receive   ┌───────────┐                                  │
//! │     │ sent │──────────► │ completed │  −sent at source,                │
//! │     └──┬───┘            └───────────┘  +received at destination       │
//! │        │   reject       ┌───────────┐                                  │
//! │        └──────────────► │ rejected  │  no movement                     │
//! │                         └───────────┘                                  │
//! │                                                                         │
//! │  Opname                                                                 │
//! │     ┌───────┐  approve  ┌──────────┐                                   │
//! │     │ draft │─────────► │ approved │  physical − live quantity         │
//! │     └───────┘           └──────────┘  (only when a difference exists)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::StockHistoryEntry;

// =============================================================================
// Posting
// =============================================================================

/// A persisted document together with the history entries it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Posting<D> {
    pub document: D,
    pub entries: Vec<StockHistoryEntry>,
}

impl<D> Posting<D> {
    pub fn new(document: D, entries: Vec<StockHistoryEntry>) -> Self {
        Posting { document, entries }
    }
}

// =============================================================================
// Inbound Receipt
// =============================================================================

/// Goods received from a supplier into a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InboundReceipt {
    pub id: String,
    pub code: String,
    pub supplier_id: String,
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[ts(as = "String")]
    pub received_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Caller input for an inbound receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InboundInput {
    pub supplier_id: String,
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[ts(as = "String")]
    pub received_date: NaiveDate,
    pub notes: Option<String>,
}

// =============================================================================
// Outbound Sale
// =============================================================================

/// Goods sold from a warehouse to a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OutboundSale {
    pub id: String,
    pub code: String,
    pub customer_id: String,
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    /// `quantity × unit_price`, rounded once.
    pub total_price: Money,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    /// Reference to an uploaded file (invoice scan, delivery note).
    pub attachment: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Caller input for an outbound sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutboundInput {
    pub customer_id: String,
    pub warehouse_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub notes: Option<String>,
    pub attachment: Option<String>,
}

// =============================================================================
// Stock Mutation
// =============================================================================

/// Lifecycle of an inter-warehouse transfer.
///
/// Stored as the canonical lowercase tag; localized labels belong to the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Goods dispatched, in transit. Source stock is untouched until receipt.
    Sent,
    /// Received at destination. Terminal.
    Completed,
    /// Refused by the destination. Terminal, no stock moved.
    Rejected,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Sent => "sent",
            MutationStatus::Completed => "completed",
            MutationStatus::Rejected => "rejected",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MutationStatus::Sent)
    }

    /// Legal transitions: `sent → completed` and `sent → rejected`.
    pub fn can_transition_to(&self, next: MutationStatus) -> bool {
        matches!(
            (self, next),
            (MutationStatus::Sent, MutationStatus::Completed)
                | (MutationStatus::Sent, MutationStatus::Rejected)
        )
    }
}

impl Default for MutationStatus {
    fn default() -> Self {
        MutationStatus::Sent
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a mutation looks from a given set of warehouses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MutationDirection {
    Outgoing,
    Incoming,
    /// Both ends are inside the scope.
    Internal,
}

/// An inter-warehouse stock transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMutation {
    pub id: String,
    pub code: String,
    pub from_warehouse_id: String,
    pub to_warehouse_id: String,
    pub product_id: String,
    /// Quantity sent; the full amount leaves the source on receipt.
    pub quantity: Quantity,
    pub received_qty: Quantity,
    pub damaged_qty: Quantity,
    pub status: MutationStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    #[ts(as = "String")]
    pub sent_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub received_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub received_by: Option<String>,
    pub rejected_by: Option<String>,
}

impl StockMutation {
    /// Fails with `InvalidState` unless `next` is a legal transition.
    pub fn ensure_transition(&self, next: MutationStatus) -> CoreResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::invalid_state("Mutation", &self.id, self.status))
        }
    }

    /// Units that left the source and were neither received nor reported
    /// damaged. Zero unless completed.
    pub fn lost_qty(&self) -> Quantity {
        match self.status {
            MutationStatus::Completed => self.quantity - self.received_qty - self.damaged_qty,
            _ => Quantity::ZERO,
        }
    }

    /// Direction relative to the caller's warehouses, or `None` when the
    /// mutation touches none of them.
    pub fn direction_for(&self, scope: &[String]) -> Option<MutationDirection> {
        let from = scope.iter().any(|w| *w == self.from_warehouse_id);
        let to = scope.iter().any(|w| *w == self.to_warehouse_id);
        match (from, to) {
            (true, true) => Some(MutationDirection::Internal),
            (true, false) => Some(MutationDirection::Outgoing),
            (false, true) => Some(MutationDirection::Incoming),
            (false, false) => None,
        }
    }
}

/// Checks a receipt split against the sent quantity.
///
/// `received + damaged` may be less than `sent`; the remainder is transit
/// loss. It may never be more.
pub fn check_receipt_split(sent: Quantity, received: Quantity, damaged: Quantity) -> CoreResult<()> {
    match received.checked_add(damaged) {
        Some(total) if total <= sent => Ok(()),
        _ => Err(CoreError::OverReceipt {
            sent,
            received,
            damaged,
        }),
    }
}

/// Caller input for sending a mutation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SendMutationInput {
    pub from_warehouse_id: String,
    pub to_warehouse_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

/// Caller input for receiving a mutation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiveMutationInput {
    pub mutation_id: String,
    pub received_qty: Quantity,
    pub damaged_qty: Quantity,
}

// =============================================================================
// Opname (physical count)
// =============================================================================

/// Sign of the gap between counted and recorded stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceType {
    /// Counted more than recorded.
    Surplus,
    /// Counted less than recorded.
    Shortage,
    None,
}

impl DifferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifferenceType::Surplus => "surplus",
            DifferenceType::Shortage => "shortage",
            DifferenceType::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OpnameStatus {
    /// Proposal; no ledger effect yet.
    Draft,
    Approved,
}

impl OpnameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpnameStatus::Draft => "draft",
            OpnameStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for OpnameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical stock count reconciled against the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Opname {
    pub id: String,
    pub code: String,
    pub warehouse_id: String,
    pub product_id: String,
    /// Ledger quantity snapshotted when the count was recorded.
    pub system_qty: Quantity,
    pub physical_qty: Quantity,
    /// `|physical_qty − system_qty|`
    pub difference_qty: Quantity,
    pub difference_type: DifferenceType,
    pub status: OpnameStatus,
    #[ts(as = "String")]
    pub opname_date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Live ledger quantity the approval delta was computed against.
    pub approved_system_qty: Option<Quantity>,
}

impl Opname {
    /// Magnitude and sign of the gap between a recorded and a counted quantity.
    pub fn difference(system: Quantity, physical: Quantity) -> (Quantity, DifferenceType) {
        let gap = physical - system;
        let kind = if gap.is_positive() {
            DifferenceType::Surplus
        } else if gap.is_negative() {
            DifferenceType::Shortage
        } else {
            DifferenceType::None
        };
        (gap.abs(), kind)
    }

    /// Fails with `InvalidState` unless the opname is still a draft.
    pub fn ensure_draft(&self) -> CoreResult<()> {
        match self.status {
            OpnameStatus::Draft => Ok(()),
            current => Err(CoreError::invalid_state("Opname", &self.id, current)),
        }
    }

    /// Delta to apply on approval against the live ledger quantity.
    ///
    /// `None` when the count recorded no difference, or when the live
    /// quantity already equals the physical count.
    pub fn adjustment_against(&self, live: Quantity) -> Option<Quantity> {
        if self.difference_type == DifferenceType::None {
            return None;
        }
        let delta = self.physical_qty - live;
        if delta.is_zero() {
            None
        } else {
            Some(delta)
        }
    }
}

/// Caller input for recording a physical count.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOpnameInput {
    pub warehouse_id: String,
    pub product_id: String,
    pub physical_qty: Quantity,
    #[ts(as = "String")]
    pub opname_date: NaiveDate,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mutation(status: MutationStatus) -> StockMutation {
        StockMutation {
            id: "m-1".to_string(),
            code: "MUT-20260105-001".to_string(),
            from_warehouse_id: "wh-a".to_string(),
            to_warehouse_id: "wh-b".to_string(),
            product_id: "p-1".to_string(),
            quantity: Quantity::from_units(30),
            received_qty: Quantity::from_units(28),
            damaged_qty: Quantity::from_units(1),
            status,
            notes: None,
            rejection_reason: None,
            sent_at: Utc::now(),
            received_at: None,
            rejected_at: None,
            created_by: "u-1".to_string(),
            received_by: None,
            rejected_by: None,
        }
    }

    fn opname(system: i64, physical: i64) -> Opname {
        let system_qty = Quantity::from_units(system);
        let physical_qty = Quantity::from_units(physical);
        let (difference_qty, difference_type) = Opname::difference(system_qty, physical_qty);
        Opname {
            id: "o-1".to_string(),
            code: "OPN-20260105-001".to_string(),
            warehouse_id: "wh-a".to_string(),
            product_id: "p-1".to_string(),
            system_qty,
            physical_qty,
            difference_qty,
            difference_type,
            status: OpnameStatus::Draft,
            opname_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            notes: None,
            created_by: "u-1".to_string(),
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            approved_system_qty: None,
        }
    }

    #[test]
    fn test_mutation_transitions() {
        assert!(MutationStatus::Sent.can_transition_to(MutationStatus::Completed));
        assert!(MutationStatus::Sent.can_transition_to(MutationStatus::Rejected));
        assert!(!MutationStatus::Completed.can_transition_to(MutationStatus::Rejected));
        assert!(!MutationStatus::Rejected.can_transition_to(MutationStatus::Completed));
        assert!(!MutationStatus::Sent.can_transition_to(MutationStatus::Sent));
    }

    #[test]
    fn test_terminal_mutation_rejects_transition() {
        let completed = mutation(MutationStatus::Completed);
        let err = completed
            .ensure_transition(MutationStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { .. }));

        assert!(mutation(MutationStatus::Sent)
            .ensure_transition(MutationStatus::Completed)
            .is_ok());
    }

    #[test]
    fn test_receipt_split() {
        let sent = Quantity::from_units(30);
        assert!(check_receipt_split(sent, Quantity::from_units(28), Quantity::from_units(2)).is_ok());
        assert!(check_receipt_split(sent, Quantity::from_units(25), Quantity::ZERO).is_ok());
        assert!(matches!(
            check_receipt_split(sent, Quantity::from_units(29), Quantity::from_units(2)),
            Err(CoreError::OverReceipt { .. })
        ));
    }

    #[test]
    fn test_lost_quantity_only_when_completed() {
        // 30 sent, 28 received, 1 damaged
        assert_eq!(
            mutation(MutationStatus::Completed).lost_qty(),
            Quantity::from_units(1)
        );
        assert!(mutation(MutationStatus::Sent).lost_qty().is_zero());
    }

    #[test]
    fn test_damaged_units_are_not_lost() {
        let mut fully_reported = mutation(MutationStatus::Completed);
        fully_reported.damaged_qty = Quantity::from_units(2);
        assert!(fully_reported.lost_qty().is_zero());
    }

    #[test]
    fn test_direction_for_scope() {
        let m = mutation(MutationStatus::Sent);
        assert_eq!(
            m.direction_for(&["wh-a".to_string()]),
            Some(MutationDirection::Outgoing)
        );
        assert_eq!(
            m.direction_for(&["wh-b".to_string()]),
            Some(MutationDirection::Incoming)
        );
        assert_eq!(
            m.direction_for(&["wh-a".to_string(), "wh-b".to_string()]),
            Some(MutationDirection::Internal)
        );
        assert_eq!(m.direction_for(&["wh-z".to_string()]), None);
    }

    #[test]
    fn test_opname_difference() {
        let shortage = opname(50, 42);
        assert_eq!(shortage.difference_qty, Quantity::from_units(8));
        assert_eq!(shortage.difference_type, DifferenceType::Shortage);

        let surplus = opname(10, 13);
        assert_eq!(surplus.difference_qty, Quantity::from_units(3));
        assert_eq!(surplus.difference_type, DifferenceType::Surplus);

        assert_eq!(opname(7, 7).difference_type, DifferenceType::None);
    }

    #[test]
    fn test_opname_adjustment_uses_live_quantity() {
        let count = opname(50, 42);

        // snapshot said 50, ledger has since moved to 45
        assert_eq!(
            count.adjustment_against(Quantity::from_units(45)),
            Some(Quantity::from_units(-3))
        );
        assert_eq!(
            count.adjustment_against(Quantity::from_units(50)),
            Some(Quantity::from_units(-8))
        );
        assert_eq!(count.adjustment_against(Quantity::from_units(42)), None);
        assert_eq!(opname(7, 7).adjustment_against(Quantity::from_units(3)), None);
    }

    #[test]
    fn test_opname_draft_guard() {
        let mut count = opname(5, 4);
        assert!(count.ensure_draft().is_ok());
        count.status = OpnameStatus::Approved;
        assert!(matches!(
            count.ensure_draft(),
            Err(CoreError::InvalidState { .. })
        ));
    }
}
