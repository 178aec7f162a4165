use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Materialized, OrderView};
use crate::domain::payment::{to_minor_units, PaymentEvent};
use crate::domain::ports::{IdempotencyGuard, NotificationDispatcher, OrderRepository};

use super::blocking;

/// What became of one confirmed, verified gateway event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Fulfilled(Uuid),
    Duplicate,
    Ignored,
    /// Fulfillment failed after the claim; the event waits for reconciliation.
    Deferred,
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Fulfilled(_) => "fulfilled",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Deferred => "deferred",
        }
    }
}

/// Turns a claimed payment event into exactly one order.
pub struct OrderMaterializer {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn IdempotencyGuard>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl OrderMaterializer {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        ledger: Arc<dyn IdempotencyGuard>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            orders,
            ledger,
            notifier,
        }
    }

    /// Creates the order from the user's live cart and clears it atomically.
    pub async fn fulfill(&self, event: &PaymentEvent) -> Result<Materialized, DomainError> {
        let refs = event.checkout_refs()?;
        let orders = Arc::clone(&self.orders);
        let claimed = event.clone();
        let outcome = blocking(move || orders.materialize(&claimed, refs)).await?;

        if let Materialized::Created(order) = &outcome {
            warn_on_amount_mismatch(event, order);
        }
        Ok(outcome)
    }

    /// Fulfills a claimed event and dispatches the confirmation. Failures are
    /// parked on the ledger instead of being returned to the gateway.
    pub async fn process(&self, event: &PaymentEvent) -> WebhookOutcome {
        match self.fulfill(event).await {
            Ok(Materialized::Created(order)) => {
                log::info!(
                    "Event {} placed order {} for user {}",
                    event.event_id,
                    order.id,
                    order.user_id
                );
                self.dispatch_notification(&order);
                WebhookOutcome::Fulfilled(order.id)
            }
            Ok(Materialized::AlreadyFulfilled) => {
                log::info!("Event {} was already fulfilled", event.event_id);
                WebhookOutcome::Duplicate
            }
            Err(e) => {
                log::error!(
                    "Fulfillment of event {} failed, queued for reconciliation: {}",
                    event.event_id,
                    e
                );
                let ledger = Arc::clone(&self.ledger);
                let event_id = event.event_id.clone();
                let error = e.to_string();
                if let Err(e) = blocking(move || ledger.record_failure(&event_id, &error)).await {
                    log::error!(
                        "Could not record failure of event {}; stale-claim recovery will retry it: {}",
                        event.event_id,
                        e
                    );
                }
                WebhookOutcome::Deferred
            }
        }
    }

    fn dispatch_notification(&self, order: &OrderView) {
        let notifier = Arc::clone(&self.notifier);
        let user_id = order.user_id;
        let summary = order.summary();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(user_id, &summary).await {
                log::warn!("Notification for order {} failed: {}", summary.order_id, e);
            }
        });
    }
}

fn warn_on_amount_mismatch(event: &PaymentEvent, order: &OrderView) {
    let Some(paid) = event.amount_total else {
        return;
    };
    match to_minor_units(&order.total_amount()) {
        Ok(ordered) if ordered == paid => {}
        Ok(ordered) => log::warn!(
            "Order {} totals {} minor units but event {} paid {}",
            order.id,
            ordered,
            event.event_id,
            paid
        ),
        Err(e) => log::warn!("Order {} total not comparable: {}", order.id, e),
    }
}
