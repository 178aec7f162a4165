use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::cart::{CartAggregate, CartLine};
use super::catalog::{Address, FoodItem};
use super::errors::DomainError;
use super::order::{ListResult, Materialized, OrderSummary, OrderView};
use super::payment::{CheckoutRefs, CheckoutSession, CheckoutSessionRequest, Claim, PaymentEvent};

/// Per-user cart lines. Mutations on one user's cart are serialized by the store.
pub trait CartStore: Send + Sync + 'static {
    /// Adds one unit of `item`, creating the line at the current catalog price.
    fn add_item(&self, user_id: Uuid, item: &FoodItem) -> Result<CartLine, DomainError>;
    /// Removes one unit; returns `None` when the line was deleted.
    fn remove_item(&self, user_id: Uuid, item: &FoodItem)
        -> Result<Option<CartLine>, DomainError>;
    fn snapshot(&self, user_id: Uuid) -> Result<CartAggregate, DomainError>;
}

pub trait Catalog: Send + Sync + 'static {
    fn find_food_item(&self, id: Uuid) -> Result<Option<FoodItem>, DomainError>;
    fn destination_account(&self, category_id: Uuid) -> Result<Option<String>, DomainError>;
}

pub trait AddressBook: Send + Sync + 'static {
    fn find_for_user(&self, user_id: Uuid, address_id: Uuid)
        -> Result<Option<Address>, DomainError>;
}

/// Durable at-most-once ledger of gateway event ids.
pub trait IdempotencyGuard: Send + Sync + 'static {
    fn claim(&self, event: &PaymentEvent) -> Result<Claim, DomainError>;
    /// Parks a claimed event for reconciliation after a failed fulfillment.
    fn record_failure(&self, event_id: &str, error: &str) -> Result<(), DomainError>;
    /// Claimed events that still need an order: failed ones under
    /// `max_attempts` and claims left untouched for longer than `stale_after`.
    fn pending_reconciliation(
        &self,
        stale_after: Duration,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PaymentEvent>, DomainError>;
    fn purge_fulfilled_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// In one transaction: take the user's current cart, write the order with
    /// its address snapshot, clear the cart and mark the event fulfilled.
    fn materialize(
        &self,
        event: &PaymentEvent,
        refs: CheckoutRefs,
    ) -> Result<Materialized, DomainError>;
    fn find_for_user(&self, user_id: Uuid, order_id: Uuid)
        -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid, page: i64, limit: i64)
        -> Result<ListResult, DomainError>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync + 'static {
    async fn notify(&self, user_id: Uuid, summary: &OrderSummary) -> Result<(), NotificationError>;
}
