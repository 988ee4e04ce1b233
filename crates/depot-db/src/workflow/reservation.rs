//! Reservations: quantity promised to a pending order.
//!
//! Reserving never changes on-hand stock and writes no history; it only
//! shrinks what [`crate::availability`] reports as available.

use chrono::Utc;
use depot_core::validation::{validate_positive_quantity, validate_uuid};
use depot_core::{CoreError, Quantity, StockKey, StockLevel};
use tracing::{info, warn};

use super::{check_actor, StockLedger};
use crate::availability;
use crate::error::LedgerResult;
use crate::repository::catalog::{self, CatalogEntity};
use crate::repository::stock;

impl StockLedger {
    /// Sets aside `quantity` of available stock.
    pub async fn reserve(
        &self,
        actor: &str,
        warehouse_id: &str,
        product_id: &str,
        quantity: Quantity,
    ) -> LedgerResult<StockLevel> {
        check_actor(actor)?;
        validate_uuid("warehouse_id", warehouse_id)?;
        validate_uuid("product_id", product_id)?;
        validate_positive_quantity("quantity", quantity)?;

        let key = StockKey::new(warehouse_id, product_id);
        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        catalog::require(&mut tx, CatalogEntity::Warehouse, warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Product, product_id).await?;

        availability::ensure(&mut tx, &key, quantity).await?;

        let now = Utc::now();
        let mut level = stock::ensure_level(&mut tx, &key, now).await?;
        level.reserved_qty += quantity;
        stock::update_reserved(&mut tx, &level.id, level.reserved_qty, actor, now).await?;

        tx.commit().await?;

        level.last_updated = now;
        level.updated_by = Some(actor.to_string());

        info!(key = %key, reserved = %level.reserved_qty, "Stock reserved");
        Ok(level)
    }

    /// Returns `quantity` of a reservation to available stock.
    pub async fn release(
        &self,
        actor: &str,
        warehouse_id: &str,
        product_id: &str,
        quantity: Quantity,
    ) -> LedgerResult<StockLevel> {
        check_actor(actor)?;
        validate_uuid("warehouse_id", warehouse_id)?;
        validate_uuid("product_id", product_id)?;
        validate_positive_quantity("quantity", quantity)?;

        let key = StockKey::new(warehouse_id, product_id);
        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        let reserved = stock::fetch_level(&mut tx, &key)
            .await?
            .map(|l| l.reserved_qty)
            .unwrap_or(Quantity::ZERO);
        if reserved < quantity {
            warn!(key = %key, reserved = %reserved, requested = %quantity, "Release exceeds reservation");
            return Err(CoreError::ReservationExceeded {
                reserved,
                requested: quantity,
            }
            .into());
        }

        let now = Utc::now();
        let mut level = stock::ensure_level(&mut tx, &key, now).await?;
        level.reserved_qty -= quantity;
        stock::update_reserved(&mut tx, &level.id, level.reserved_qty, actor, now).await?;

        tx.commit().await?;

        level.last_updated = now;
        level.updated_by = Some(actor.to_string());

        info!(key = %key, reserved = %level.reserved_qty, "Reservation released");
        Ok(level)
    }
}
