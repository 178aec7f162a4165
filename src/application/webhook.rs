use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::payment::Claim;
use crate::domain::ports::IdempotencyGuard;

use super::blocking;
use super::fulfillment::{OrderMaterializer, WebhookOutcome};
use super::webhook_verifier::WebhookVerifier;

/// Verify → claim → materialize pipeline behind the gateway callback.
pub struct WebhookProcessor {
    verifier: WebhookVerifier,
    ledger: Arc<dyn IdempotencyGuard>,
    materializer: Arc<OrderMaterializer>,
}

impl WebhookProcessor {
    pub fn new(
        verifier: WebhookVerifier,
        ledger: Arc<dyn IdempotencyGuard>,
        materializer: Arc<OrderMaterializer>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            materializer,
        }
    }

    /// Errors are only returned when the gateway should redeliver: a bad
    /// signature or body, or a claim that could not be recorded.
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookOutcome, DomainError> {
        let event = self
            .verifier
            .verify(raw_body, signature_header)
            .inspect_err(|e| log::warn!("Rejected payment webhook: {}", e))?;

        if !event.is_payment_confirmation() {
            log::info!(
                "Ignoring event {} of type {}",
                event.event_id,
                event.event_type
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let ledger = Arc::clone(&self.ledger);
        let claimed = event.clone();
        let claim = blocking(move || ledger.claim(&claimed))
            .await
            .inspect_err(|e| log::error!("Could not claim event {}: {}", event.event_id, e))?;

        match claim {
            Claim::AlreadyProcessed => {
                log::info!("Duplicate delivery of event {}", event.event_id);
                Ok(WebhookOutcome::Duplicate)
            }
            Claim::FirstSeen => Ok(self.materializer.process(&event).await),
        }
    }
}
