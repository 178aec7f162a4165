use std::time::Duration;

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::payment::{Claim, PaymentEvent};
use crate::domain::ports::IdempotencyGuard;
use crate::schema::payment_events;

use super::models::{EventStatus, NewPaymentEventRow, PaymentEventRow};

/// Postgres-backed idempotency ledger keyed by the gateway event id.
///
/// The row doubles as the dead-letter entry: it keeps the normalized event
/// so a failed fulfillment can be replayed without the gateway.
pub struct DieselPaymentEventLedger {
    pool: DbPool,
}

impl DieselPaymentEventLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl IdempotencyGuard for DieselPaymentEventLedger {
    fn claim(&self, event: &PaymentEvent) -> Result<Claim, DomainError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| DomainError::Internal(format!("cannot encode event: {e}")))?;
        let mut conn = self.pool.get()?;

        // The primary key makes this a single atomic check-and-set: of any
        // number of concurrent inserts for one event id exactly one lands.
        let inserted = diesel::insert_into(payment_events::table)
            .values(&NewPaymentEventRow {
                event_id: event.event_id.clone(),
                event_type: event.event_type.clone(),
                payload,
                status: EventStatus::Claimed.as_str().to_string(),
            })
            .on_conflict(payment_events::event_id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(if inserted == 1 {
            Claim::FirstSeen
        } else {
            Claim::AlreadyProcessed
        })
    }

    fn record_failure(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::update(
            payment_events::table
                .filter(payment_events::event_id.eq(event_id))
                .filter(payment_events::status.ne(EventStatus::Fulfilled.as_str())),
        )
        .set((
            payment_events::status.eq(EventStatus::Failed.as_str()),
            payment_events::attempts.eq(payment_events::attempts + 1),
            payment_events::last_error.eq(Some(error)),
            payment_events::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    fn pending_reconciliation(
        &self,
        stale_after: Duration,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PaymentEvent>, DomainError> {
        let stale_after = chrono::Duration::from_std(stale_after)
            .map_err(|e| DomainError::InvalidInput(format!("stale threshold: {e}")))?;
        let stale_cutoff = Utc::now() - stale_after;
        let mut conn = self.pool.get()?;

        let rows = payment_events::table
            .filter(
                payment_events::status
                    .eq(EventStatus::Failed.as_str())
                    .and(payment_events::attempts.lt(max_attempts))
                    .or(payment_events::status
                        .eq(EventStatus::Claimed.as_str())
                        .and(payment_events::updated_at.lt(stale_cutoff))),
            )
            .order(payment_events::created_at.asc())
            .limit(limit)
            .select(PaymentEventRow::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row.payload).map_err(|e| {
                    DomainError::Internal(format!("stored event {} is unreadable: {e}", row.event_id))
                })
            })
            .collect()
    }

    fn purge_fulfilled_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let purged = diesel::delete(
            payment_events::table
                .filter(payment_events::status.eq(EventStatus::Fulfilled.as_str()))
                .filter(payment_events::created_at.lt(cutoff)),
        )
        .execute(&mut conn)?;

        Ok(purged)
    }
}
