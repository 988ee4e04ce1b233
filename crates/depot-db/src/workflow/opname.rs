//! Physical stock counts.
//!
//! ```text
//!   create  ─► draft     snapshot system_qty, record the gap, no stock moves
//!   approve ─► approved  move the live quantity to the physical count
//! ```
//!
//! Approval re-reads the live quantity rather than trusting the snapshot:
//! sales and receipts between count and approval are preserved and the
//! line still ends exactly at the counted figure.

use chrono::Utc;
use depot_core::validation::{validate_create_opname, validate_uuid};
use depot_core::{
    CoreError, CreateOpnameInput, DocumentKind, Opname, OpnameStatus, Posting, Quantity,
    Reference, ReferenceType, StockKey,
};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::{check_actor, StockLedger};
use crate::error::{LedgerError, LedgerResult};
use crate::mutator::{self, StockDelta};
use crate::repository::catalog::{self, CatalogEntity};
use crate::repository::{opname, stock};

async fn load(conn: &mut SqliteConnection, id: &str) -> LedgerResult<Opname> {
    opname::get(conn, id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Opname", id))
}

async fn live_quantity(conn: &mut SqliteConnection, key: &StockKey) -> LedgerResult<Quantity> {
    let level = stock::fetch_level(conn, key).await?;
    Ok(level.map(|l| l.quantity).unwrap_or(Quantity::ZERO))
}

impl StockLedger {
    /// Records a count as a draft. One count per stock line per day.
    pub async fn create_opname(&self, actor: &str, input: CreateOpnameInput) -> LedgerResult<Opname> {
        check_actor(actor)?;
        validate_create_opname(&input)?;

        let key = StockKey::new(&input.warehouse_id, &input.product_id);
        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        catalog::require(&mut tx, CatalogEntity::Warehouse, &input.warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Product, &input.product_id).await?;

        if let Some(existing) = opname::find_for_line(&mut tx, &key, input.opname_date).await? {
            warn!(key = %key, date = %input.opname_date, existing = %existing.code, "Duplicate opname");
            return Err(CoreError::DuplicateOpname {
                warehouse_id: input.warehouse_id,
                product_id: input.product_id,
                date: input.opname_date,
            }
            .into());
        }

        let system_qty = live_quantity(&mut tx, &key).await?;
        let (difference_qty, difference_type) = Opname::difference(system_qty, input.physical_qty);

        let now = Utc::now();
        let code = self.next_code(&mut tx, DocumentKind::Opname, now).await?;

        let draft = Opname {
            id: Uuid::new_v4().to_string(),
            code,
            warehouse_id: input.warehouse_id,
            product_id: input.product_id,
            system_qty,
            physical_qty: input.physical_qty,
            difference_qty,
            difference_type,
            status: OpnameStatus::Draft,
            opname_date: input.opname_date,
            notes: input.notes,
            created_by: actor.to_string(),
            created_at: now,
            approved_by: None,
            approved_at: None,
            approved_system_qty: None,
        };
        opname::insert(&mut tx, &draft).await?;

        tx.commit().await?;

        info!(
            code = %draft.code,
            key = %key,
            system = %draft.system_qty,
            physical = %draft.physical_qty,
            difference = %draft.difference_qty,
            difference_type = draft.difference_type.as_str(),
            "Opname drafted"
        );

        Ok(draft)
    }

    /// Approves a draft and adjusts the line to the counted quantity.
    ///
    /// The adjustment is `physical_qty - live_qty`. A draft that recorded
    /// no difference is approved without touching stock.
    pub async fn approve_opname(&self, actor: &str, opname_id: &str) -> LedgerResult<Posting<Opname>> {
        check_actor(actor)?;
        validate_uuid("opname_id", opname_id)?;

        let key = {
            let mut conn = self.database().pool().acquire().await?;
            let pending = load(&mut conn, opname_id).await?;
            StockKey::new(&pending.warehouse_id, &pending.product_id)
        };

        let _guard = self.lock([key.clone()]).await?;
        let mut tx = self.begin().await?;

        let mut approved = load(&mut tx, opname_id).await?;
        approved.ensure_draft().map_err(|err| {
            warn!(code = %approved.code, status = %approved.status, "Opname already approved");
            LedgerError::from(err)
        })?;

        let live = live_quantity(&mut tx, &key).await?;
        let now = Utc::now();

        let mut entries = Vec::new();
        if let Some(change) = approved.adjustment_against(live) {
            let delta = StockDelta::new(
                key.clone(),
                change,
                Reference::new(ReferenceType::Opname, &approved.id, &approved.code),
            )
            .with_notes(approved.notes.clone());
            entries.push(mutator::apply(&mut tx, &delta, actor, now).await?);
        }

        let updated = opname::mark_approved(&mut tx, &approved.id, live, actor, now).await?;
        if !updated {
            return Err(CoreError::invalid_state("Opname", &approved.id, approved.status).into());
        }

        tx.commit().await?;

        approved.status = OpnameStatus::Approved;
        approved.approved_by = Some(actor.to_string());
        approved.approved_at = Some(now);
        approved.approved_system_qty = Some(live);

        info!(
            code = %approved.code,
            key = %key,
            snapshot = %approved.system_qty,
            live = %live,
            physical = %approved.physical_qty,
            adjusted = !entries.is_empty(),
            "Opname approved"
        );

        Ok(Posting::new(approved, entries))
    }
}
