use std::sync::Arc;

use chrono::Utc;

use crate::config::ReconcileSettings;
use crate::domain::errors::DomainError;
use crate::domain::ports::IdempotencyGuard;

use super::blocking;
use super::fulfillment::{OrderMaterializer, WebhookOutcome};

/// Events retried per pass.
const BATCH_SIZE: i64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub retried: usize,
    pub fulfilled: usize,
    pub duplicates: usize,
    pub deferred: usize,
}

/// Background retry path for events whose fulfillment failed or never
/// finished after the claim.
pub struct Reconciler {
    ledger: Arc<dyn IdempotencyGuard>,
    materializer: Arc<OrderMaterializer>,
    settings: ReconcileSettings,
}

impl Reconciler {
    pub fn new(
        ledger: Arc<dyn IdempotencyGuard>,
        materializer: Arc<OrderMaterializer>,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            ledger,
            materializer,
            settings,
        }
    }

    pub fn interval(&self) -> std::time::Duration {
        self.settings.interval
    }

    pub async fn retry_pending(&self) -> Result<ReconcileReport, DomainError> {
        let ledger = Arc::clone(&self.ledger);
        let stale_after = self.settings.stale_claim_after;
        let max_attempts = self.settings.max_attempts;
        let pending = blocking(move || {
            ledger.pending_reconciliation(stale_after, max_attempts, BATCH_SIZE)
        })
        .await?;

        let mut report = ReconcileReport::default();
        for event in pending {
            report.retried += 1;
            match self.materializer.process(&event).await {
                WebhookOutcome::Fulfilled(_) => report.fulfilled += 1,
                WebhookOutcome::Duplicate => report.duplicates += 1,
                WebhookOutcome::Deferred => report.deferred += 1,
                WebhookOutcome::Ignored => {}
            }
        }
        Ok(report)
    }

    /// Drops fulfilled ledger rows older than the retention window.
    pub async fn purge_expired(&self) -> Result<usize, DomainError> {
        let retention = chrono::Duration::from_std(self.settings.retention)
            .map_err(|e| DomainError::InvalidInput(format!("retention: {e}")))?;
        let cutoff = Utc::now() - retention;
        let ledger = Arc::clone(&self.ledger);
        blocking(move || ledger.purge_fulfilled_before(cutoff)).await
    }

    /// One background pass; errors are logged and the next tick tries again.
    pub async fn run_once(&self) {
        match self.retry_pending().await {
            Ok(report) if report.retried > 0 => log::info!("Reconciliation pass: {:?}", report),
            Ok(_) => {}
            Err(e) => log::error!("Reconciliation pass failed: {}", e),
        }
        match self.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => log::info!("Purged {} expired idempotency record(s)", purged),
            Err(e) => log::error!("Idempotency purge failed: {}", e),
        }
    }
}
