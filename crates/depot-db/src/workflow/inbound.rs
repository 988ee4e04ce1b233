//! Inbound receipts: supplier goods credited to a warehouse.

use chrono::Utc;
use depot_core::validation::validate_inbound;
use depot_core::{
    DocumentKind, InboundInput, InboundReceipt, Posting, Reference, ReferenceType, StockKey,
};
use tracing::info;
use uuid::Uuid;

use super::{check_actor, StockLedger};
use crate::error::LedgerResult;
use crate::mutator::{self, StockDelta};
use crate::repository::catalog::{self, CatalogEntity};
use crate::repository::inbound;

impl StockLedger {
    /// Records a receipt and credits `quantity` to the warehouse.
    ///
    /// Not idempotent: a retried call creates a second receipt and a second
    /// credit. Callers retrying after an ambiguous failure should look the
    /// first attempt up by code.
    pub async fn receive_inbound(
        &self,
        actor: &str,
        input: InboundInput,
    ) -> LedgerResult<Posting<InboundReceipt>> {
        check_actor(actor)?;
        validate_inbound(&input)?;

        let key = StockKey::new(&input.warehouse_id, &input.product_id);
        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        catalog::require(&mut tx, CatalogEntity::Supplier, &input.supplier_id).await?;
        catalog::require(&mut tx, CatalogEntity::Warehouse, &input.warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Product, &input.product_id).await?;

        let now = Utc::now();
        let code = self.next_code(&mut tx, DocumentKind::Inbound, now).await?;

        let receipt = InboundReceipt {
            id: Uuid::new_v4().to_string(),
            code,
            supplier_id: input.supplier_id,
            warehouse_id: input.warehouse_id,
            product_id: input.product_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
            received_date: input.received_date,
            notes: input.notes,
            created_by: actor.to_string(),
            created_at: now,
        };
        inbound::insert(&mut tx, &receipt).await?;

        let delta = StockDelta::new(
            key,
            receipt.quantity,
            Reference::new(ReferenceType::Inbound, &receipt.id, &receipt.code),
        )
        .with_notes(receipt.notes.clone());
        let entry = mutator::apply(&mut tx, &delta, actor, now).await?;

        tx.commit().await?;

        info!(
            code = %receipt.code,
            warehouse_id = %receipt.warehouse_id,
            product_id = %receipt.product_id,
            quantity = %receipt.quantity,
            new_qty = %entry.new_qty,
            "Inbound receipt recorded"
        );

        Ok(Posting::new(receipt, vec![entry]))
    }
}
