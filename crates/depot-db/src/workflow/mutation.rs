//! Inter-warehouse transfers.
//!
//! ```text
//!   send     ─► status=sent       no stock moves (goods in transit)
//!   receive  ─► status=completed  −sent at source, +received at destination
//!   reject   ─► status=rejected   no stock moves
//! ```
//!
//! Damaged and unaccounted units leave the source but are credited nowhere.

use chrono::Utc;
use depot_core::validation::{
    validate_notes, validate_receipt_against, validate_receive_mutation, validate_send_mutation,
    validate_uuid,
};
use depot_core::{
    CoreError, DocumentKind, MutationStatus, Posting, Quantity, ReceiveMutationInput, Reference,
    ReferenceType, SendMutationInput, StockKey, StockMutation,
};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

use super::{check_actor, StockLedger};
use crate::availability;
use crate::error::{LedgerError, LedgerResult};
use crate::mutator::{self, StockDelta};
use crate::repository::catalog::{self, CatalogEntity};
use crate::repository::mutation;

fn source_key(m: &StockMutation) -> StockKey {
    StockKey::new(&m.from_warehouse_id, &m.product_id)
}

fn destination_key(m: &StockMutation) -> StockKey {
    StockKey::new(&m.to_warehouse_id, &m.product_id)
}

async fn load(conn: &mut SqliteConnection, id: &str) -> LedgerResult<StockMutation> {
    mutation::get(conn, id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Mutation", id))
}

fn ensure_transition(m: &StockMutation, next: MutationStatus) -> LedgerResult<()> {
    m.ensure_transition(next).map_err(|err| {
        warn!(code = %m.code, status = %m.status, next = %next, "Mutation transition refused");
        LedgerError::from(err)
    })
}

impl StockLedger {
    /// Dispatches goods from one warehouse to another.
    ///
    /// Availability is checked at the source, but nothing is debited until
    /// the destination receives.
    pub async fn send_mutation(
        &self,
        actor: &str,
        input: SendMutationInput,
    ) -> LedgerResult<StockMutation> {
        check_actor(actor)?;
        validate_send_mutation(&input)?;

        let source = StockKey::new(&input.from_warehouse_id, &input.product_id);
        let _guard = self.lock([source.clone()]).await?;
        let mut tx = self.begin().await?;

        catalog::require(&mut tx, CatalogEntity::Warehouse, &input.from_warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Warehouse, &input.to_warehouse_id).await?;
        catalog::require(&mut tx, CatalogEntity::Product, &input.product_id).await?;

        availability::ensure(&mut tx, &source, input.quantity).await?;

        let now = Utc::now();
        let code = self.next_code(&mut tx, DocumentKind::Mutation, now).await?;

        let sent = StockMutation {
            id: Uuid::new_v4().to_string(),
            code,
            from_warehouse_id: input.from_warehouse_id,
            to_warehouse_id: input.to_warehouse_id,
            product_id: input.product_id,
            quantity: input.quantity,
            received_qty: Quantity::ZERO,
            damaged_qty: Quantity::ZERO,
            status: MutationStatus::Sent,
            notes: input.notes,
            rejection_reason: None,
            sent_at: now,
            received_at: None,
            rejected_at: None,
            created_by: actor.to_string(),
            received_by: None,
            rejected_by: None,
        };
        mutation::insert(&mut tx, &sent).await?;

        tx.commit().await?;

        info!(
            code = %sent.code,
            from = %sent.from_warehouse_id,
            to = %sent.to_warehouse_id,
            product_id = %sent.product_id,
            quantity = %sent.quantity,
            "Mutation sent"
        );

        Ok(sent)
    }

    /// Completes a transfer: debits the full sent quantity from the source
    /// and credits `received_qty` to the destination.
    pub async fn receive_mutation(
        &self,
        actor: &str,
        input: ReceiveMutationInput,
    ) -> LedgerResult<Posting<StockMutation>> {
        check_actor(actor)?;
        validate_receive_mutation(&input)?;

        // the mutation's lines are needed before locking; they never change
        let keys = {
            let mut conn = self.database().pool().acquire().await?;
            let pending = load(&mut conn, &input.mutation_id).await?;
            [source_key(&pending), destination_key(&pending)]
        };

        let _guard = self.lock(keys).await?;
        let mut tx = self.begin().await?;

        let mut received = load(&mut tx, &input.mutation_id).await?;
        ensure_transition(&received, MutationStatus::Completed)?;
        validate_receipt_against(&input, received.quantity)?;

        let now = Utc::now();
        let mut entries = Vec::with_capacity(2);

        let debit = StockDelta::new(
            source_key(&received),
            -received.quantity,
            Reference::new(ReferenceType::MutationSent, &received.id, &received.code),
        );
        entries.push(mutator::apply(&mut tx, &debit, actor, now).await?);

        if input.received_qty.is_positive() {
            let credit = StockDelta::new(
                destination_key(&received),
                input.received_qty,
                Reference::new(ReferenceType::MutationReceived, &received.id, &received.code),
            );
            entries.push(mutator::apply(&mut tx, &credit, actor, now).await?);
        }

        let updated = mutation::mark_completed(
            &mut tx,
            &received.id,
            input.received_qty,
            input.damaged_qty,
            actor,
            now,
        )
        .await?;
        if !updated {
            return Err(CoreError::invalid_state("Mutation", &received.id, received.status).into());
        }

        tx.commit().await?;

        received.status = MutationStatus::Completed;
        received.received_qty = input.received_qty;
        received.damaged_qty = input.damaged_qty;
        received.received_at = Some(now);
        received.received_by = Some(actor.to_string());

        info!(
            code = %received.code,
            sent = %received.quantity,
            received = %received.received_qty,
            damaged = %received.damaged_qty,
            lost = %received.lost_qty(),
            "Mutation received"
        );

        Ok(Posting::new(received, entries))
    }

    /// Refuses a transfer. Nothing left the source, so nothing moves.
    pub async fn reject_mutation(
        &self,
        actor: &str,
        mutation_id: &str,
        notes: Option<String>,
    ) -> LedgerResult<StockMutation> {
        check_actor(actor)?;
        validate_uuid("mutation_id", mutation_id)?;
        validate_notes(notes.as_deref())?;

        let keys = {
            let mut conn = self.database().pool().acquire().await?;
            let pending = load(&mut conn, mutation_id).await?;
            [source_key(&pending), destination_key(&pending)]
        };

        let _guard = self.lock(keys).await?;
        let mut tx = self.begin().await?;

        let mut rejected = load(&mut tx, mutation_id).await?;
        ensure_transition(&rejected, MutationStatus::Rejected)?;

        let now = Utc::now();
        let updated =
            mutation::mark_rejected(&mut tx, &rejected.id, notes.as_deref(), actor, now).await?;
        if !updated {
            return Err(CoreError::invalid_state("Mutation", &rejected.id, rejected.status).into());
        }

        tx.commit().await?;

        rejected.status = MutationStatus::Rejected;
        rejected.rejection_reason = notes;
        rejected.rejected_at = Some(now);
        rejected.rejected_by = Some(actor.to_string());

        info!(code = %rejected.code, "Mutation rejected");

        Ok(rejected)
    }
}
