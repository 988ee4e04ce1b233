//! Ledger replay.
//!
//! Folding a stock line's history in `entry_seq` order from zero must land on
//! the line's recorded quantity, and every entry must pick up where the
//! previous one left off.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::types::StockHistoryEntry;

/// Outcome of replaying one stock line's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReplayReport {
    /// Sum of every `change_qty`.
    pub replayed: Quantity,
    /// Quantity currently on the stock line.
    pub recorded: Quantity,
    pub entries: usize,
    /// `entry_seq` of the first entry whose `previous_qty` or `change_qty`
    /// does not chain from its predecessor.
    pub first_break: Option<i64>,
    pub consistent: bool,
}

/// Replays `entries` (already ordered by `entry_seq`) against `recorded`.
pub fn replay(entries: &[StockHistoryEntry], recorded: Quantity) -> ReplayReport {
    let mut running = Quantity::ZERO;
    let mut first_break = None;

    for entry in entries {
        let chained = entry.previous_qty == running
            && entry.new_qty - entry.previous_qty == entry.change_qty;
        if !chained && first_break.is_none() {
            first_break = Some(entry.entry_seq);
        }
        running += entry.change_qty;
    }

    ReplayReport {
        replayed: running,
        recorded,
        entries: entries.len(),
        first_break,
        consistent: first_break.is_none() && running == recorded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReferenceType;
    use chrono::Utc;

    fn entry(seq: i64, previous: i64, change: i64) -> StockHistoryEntry {
        StockHistoryEntry {
            id: format!("h-{seq}"),
            stock_level_id: "sl-1".to_string(),
            entry_seq: seq,
            warehouse_id: "wh-a".to_string(),
            product_id: "p-1".to_string(),
            previous_qty: Quantity::from_units(previous),
            new_qty: Quantity::from_units(previous + change),
            change_qty: Quantity::from_units(change),
            reference_type: ReferenceType::Inbound,
            reference_id: format!("doc-{seq}"),
            reference_code: format!("IN-20260105-{seq:03}"),
            notes: None,
            actor: "u-1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_consistent_history() {
        let entries = vec![entry(1, 0, 100), entry(2, 100, -30), entry(3, 70, -8)];
        let report = replay(&entries, Quantity::from_units(62));
        assert_eq!(report.replayed, Quantity::from_units(62));
        assert_eq!(report.entries, 3);
        assert!(report.consistent);
        assert_eq!(report.first_break, None);
    }

    #[test]
    fn test_drifted_level() {
        let entries = vec![entry(1, 0, 100)];
        let report = replay(&entries, Quantity::from_units(90));
        assert!(!report.consistent);
        assert_eq!(report.first_break, None);
    }

    #[test]
    fn test_broken_chain() {
        // second entry claims to start from 90 after the first ended at 100
        let entries = vec![entry(1, 0, 100), entry(2, 90, -20)];
        let report = replay(&entries, Quantity::from_units(80));
        assert_eq!(report.first_break, Some(2));
        assert!(!report.consistent);
    }

    #[test]
    fn test_empty_history() {
        let report = replay(&[], Quantity::ZERO);
        assert!(report.consistent);
        assert_eq!(report.entries, 0);
    }
}
