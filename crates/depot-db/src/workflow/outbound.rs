//! Outbound sales: warehouse stock debited to a customer.

use chrono::Utc;
use depot_core::validation::{sale_total, validate_outbound};
use depot_core::{
    DocumentKind, OutboundInput, OutboundSale, Posting, Reference, ReferenceType, StockKey,
};
use tracing::info;
use uuid::Uuid;

use super::{check_actor, StockLedger};
use crate::availability;
use crate::error::LedgerResult;
use crate::mutator::{self, StockDelta};
use crate::repository::catalog::{self, CatalogEntity};
use crate::repository::outbound;

impl StockLedger {
    /// Records a sale and debits `quantity` from the warehouse.
    ///
    /// Availability is checked under the stock line lock, so two concurrent
    /// sales can never both pass against the same units.
    pub async fn sell_outbound(
        &self,
        actor: &str,
        input: OutboundInput,
    ) -> LedgerResult<Posting<OutboundSale>> {
        check_actor(actor)?;
        validate_outbound(&input)?;
        let total_price = sale_total(input.unit_price, input.quantity)?;

        let key = StockKey::new(&input.warehouse_id, &input.product_id);
        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        catalog::require(&mut tx, CatalogEntity::Customer, &input.customer_id).await?;
        catalog::require(&mut tx, CatalogEntity::Warehouse, &input.warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Product, &input.product_id).await?;

        availability::ensure(&mut tx, &key, input.quantity).await?;

        let now = Utc::now();
        let code = self.next_code(&mut tx, DocumentKind::Outbound, now).await?;

        let sale = OutboundSale {
            id: Uuid::new_v4().to_string(),
            code,
            customer_id: input.customer_id,
            warehouse_id: input.warehouse_id,
            product_id: input.product_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
            total_price,
            sale_date: input.sale_date,
            notes: input.notes,
            attachment: input.attachment,
            created_by: actor.to_string(),
            created_at: now,
        };
        outbound::insert(&mut tx, &sale).await?;

        let delta = StockDelta::new(
            key,
            -sale.quantity,
            Reference::new(ReferenceType::Outbound, &sale.id, &sale.code),
        )
        .with_notes(sale.notes.clone());
        let entry = mutator::apply(&mut tx, &delta, actor, now).await?;

        tx.commit().await?;

        info!(
            code = %sale.code,
            warehouse_id = %sale.warehouse_id,
            product_id = %sale.product_id,
            quantity = %sale.quantity,
            total_price = %sale.total_price,
            new_qty = %entry.new_qty,
            "Outbound sale recorded"
        );

        Ok(Posting::new(sale, vec![entry]))
    }
}
