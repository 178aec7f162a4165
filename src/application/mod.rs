pub mod cart_service;
pub mod checkout;
pub mod fulfillment;
pub mod order_service;
pub mod reconciliation;
pub mod webhook;
pub mod webhook_verifier;

#[cfg(test)]
pub(crate) mod fakes;

use crate::domain::errors::DomainError;

/// Runs a synchronous port call on the blocking pool so Diesel never stalls
/// the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(format!("blocking task failed: {e}")))?
}
