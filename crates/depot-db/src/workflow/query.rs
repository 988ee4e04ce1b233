//! Read side of the ledger.
//!
//! Queries take no stock line locks and only ever see committed workflows.

use depot_core::ledger::{replay, ReplayReport};
use depot_core::{
    Availability, InboundReceipt, MutationStatus, Opname, OutboundSale, Quantity, ReferenceType,
    StockHistoryEntry, StockKey, StockLevel, StockMutation,
};
use sqlx::pool::PoolConnection;
use sqlx::Sqlite;
use tracing::warn;

use super::StockLedger;
use crate::availability;
use crate::error::{LedgerError, LedgerResult};
use crate::repository::{inbound, mutation, opname, outbound, stock};

impl StockLedger {
    async fn read(&self) -> LedgerResult<PoolConnection<Sqlite>> {
        Ok(self.database().pool().acquire().await?)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// The stock line, or `None` if nothing was ever posted to it.
    pub async fn stock_level(&self, warehouse_id: &str, product_id: &str) -> LedgerResult<Option<StockLevel>> {
        let mut conn = self.read().await?;
        let key = StockKey::new(warehouse_id, product_id);
        Ok(stock::fetch_level(&mut conn, &key).await?)
    }

    pub async fn availability(&self, warehouse_id: &str, product_id: &str) -> LedgerResult<Availability> {
        let mut conn = self.read().await?;
        let key = StockKey::new(warehouse_id, product_id);
        Ok(availability::check(&mut conn, &key).await?)
    }

    /// Every line held by a warehouse, including lines that dropped to zero.
    pub async fn stock_for_warehouse(&self, warehouse_id: &str) -> LedgerResult<Vec<StockLevel>> {
        let mut conn = self.read().await?;
        Ok(stock::list_levels_for_warehouse(&mut conn, warehouse_id).await?)
    }

    /// History of one stock line in `entry_seq` order.
    pub async fn history(&self, warehouse_id: &str, product_id: &str) -> LedgerResult<Vec<StockHistoryEntry>> {
        let mut conn = self.read().await?;
        let key = StockKey::new(warehouse_id, product_id);
        Ok(stock::history_for_line(&mut conn, &key).await?)
    }

    /// Entries posted by one document.
    ///
    /// A received mutation posts under two reference types; pass
    /// [`ReferenceType::MutationSent`] and [`ReferenceType::MutationReceived`]
    /// separately.
    pub async fn history_for_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &str,
    ) -> LedgerResult<Vec<StockHistoryEntry>> {
        let mut conn = self.read().await?;
        Ok(stock::history_for_reference(&mut conn, reference_type, reference_id).await?)
    }

    /// Replays a stock line's history and compares it with the stored level.
    ///
    /// An inconsistent report means the database was edited outside the
    /// ledger. It is logged, never repaired.
    pub async fn reconcile(&self, warehouse_id: &str, product_id: &str) -> LedgerResult<ReplayReport> {
        let mut conn = self.read().await?;
        let key = StockKey::new(warehouse_id, product_id);

        let recorded = stock::fetch_level(&mut conn, &key)
            .await?
            .map(|l| l.quantity)
            .unwrap_or(Quantity::ZERO);
        let entries = stock::history_for_line(&mut conn, &key).await?;

        let report = replay(&entries, recorded);
        if !report.consistent {
            warn!(
                key = %key,
                replayed = %report.replayed,
                recorded = %report.recorded,
                first_break = ?report.first_break,
                "Stock history does not replay to the recorded level"
            );
        }
        Ok(report)
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub async fn inbound(&self, id: &str) -> LedgerResult<InboundReceipt> {
        let mut conn = self.read().await?;
        inbound::get(&mut conn, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Inbound", id))
    }

    pub async fn inbound_by_code(&self, code: &str) -> LedgerResult<InboundReceipt> {
        let mut conn = self.read().await?;
        inbound::get_by_code(&mut conn, code)
            .await?
            .ok_or_else(|| LedgerError::not_found("Inbound", code))
    }

    pub async fn outbound(&self, id: &str) -> LedgerResult<OutboundSale> {
        let mut conn = self.read().await?;
        outbound::get(&mut conn, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Outbound", id))
    }

    pub async fn outbound_by_code(&self, code: &str) -> LedgerResult<OutboundSale> {
        let mut conn = self.read().await?;
        outbound::get_by_code(&mut conn, code)
            .await?
            .ok_or_else(|| LedgerError::not_found("Outbound", code))
    }

    pub async fn mutation(&self, id: &str) -> LedgerResult<StockMutation> {
        let mut conn = self.read().await?;
        mutation::get(&mut conn, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Mutation", id))
    }

    /// Mutations where the warehouse is source or destination, newest first.
    pub async fn mutations_for_warehouse(
        &self,
        warehouse_id: &str,
        status: Option<MutationStatus>,
    ) -> LedgerResult<Vec<StockMutation>> {
        let mut conn = self.read().await?;
        Ok(mutation::list_for_warehouse(&mut conn, warehouse_id, status).await?)
    }

    pub async fn opname(&self, id: &str) -> LedgerResult<Opname> {
        let mut conn = self.read().await?;
        opname::get(&mut conn, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Opname", id))
    }
}
