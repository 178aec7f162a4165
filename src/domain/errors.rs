use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Seller has not enabled payments")]
    PaymentNotConfigured,
    #[error("Payment gateway unavailable: {0}")]
    PaymentGatewayUnavailable(String),
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Corrupt payment event: {0}")]
    CorruptEvent(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
