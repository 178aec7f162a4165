use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Address as it was when the order was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressSnapshot {
    pub address_id: Uuid,
    pub area: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineView {
    pub id: Uuid,
    pub food_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderLineView {
    pub fn line_amount(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_event_id: String,
    pub payment_reference: Option<String>,
    pub address: AddressSnapshot,
    pub active: bool,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

impl OrderView {
    pub fn total_amount(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + line.line_amount())
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_id: self.id,
            item_count: self.lines.len(),
            total_amount: self.total_amount().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Outcome of turning a claimed payment event into an order.
#[derive(Debug, Clone)]
pub enum Materialized {
    Created(OrderView),
    /// The event's order was already committed by an earlier attempt.
    AlreadyFulfilled,
}

/// What downstream notification receives about a placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub item_count: usize,
    pub total_amount: String,
}

impl OrderSummary {
    pub fn message(&self) -> String {
        format!(
            "Order placed ({} item(s), total {}). Happy eating!",
            self.item_count, self.total_amount
        )
    }
}
