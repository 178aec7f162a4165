use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

pub const METADATA_USER_ID: &str = "user_id";
pub const METADATA_ADDRESS_ID: &str = "address_id";
pub const METADATA_DESTINATION: &str = "destination_account";

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

/// Gateway notification after signature verification, normalized.
///
/// `event_id` is the idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_id: String,
    pub event_type: String,
    pub payment_reference: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Correlation data echoed back by the gateway from the checkout intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutRefs {
    pub user_id: Uuid,
    pub address_id: Uuid,
}

impl PaymentEvent {
    /// Whether this event means the buyer's money has been captured.
    ///
    /// A completed session can still be unpaid (delayed payment methods); in
    /// that case the async success event is the confirmation.
    pub fn is_payment_confirmation(&self) -> bool {
        match self.event_type.as_str() {
            CHECKOUT_COMPLETED => matches!(
                self.payment_status.as_deref(),
                Some("paid") | Some("no_payment_required")
            ),
            ASYNC_PAYMENT_SUCCEEDED => true,
            _ => false,
        }
    }

    pub fn checkout_refs(&self) -> Result<CheckoutRefs, DomainError> {
        Ok(CheckoutRefs {
            user_id: self.metadata_uuid(METADATA_USER_ID)?,
            address_id: self.metadata_uuid(METADATA_ADDRESS_ID)?,
        })
    }

    pub fn transfer_destination(&self) -> Option<&str> {
        self.metadata.get(METADATA_DESTINATION).map(String::as_str)
    }

    fn metadata_uuid(&self, key: &str) -> Result<Uuid, DomainError> {
        let raw = self.metadata.get(key).ok_or_else(|| {
            DomainError::CorruptEvent(format!("event {} has no `{key}` metadata", self.event_id))
        })?;
        Uuid::parse_str(raw).map_err(|e| {
            DomainError::CorruptEvent(format!(
                "event {} has malformed `{key}` metadata: {e}",
                self.event_id
            ))
        })
    }
}

/// Result of recording an event id in the idempotency ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    FirstSeen,
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayLineItem {
    pub name: String,
    pub description: String,
    /// Price of one unit in minor currency units.
    pub unit_amount: i64,
    pub quantity: i32,
}

/// Everything the gateway needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub line_items: Vec<GatewayLineItem>,
    pub destination_account: String,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Converts a decimal amount to integer minor units (e.g. paise, cents).
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, DomainError> {
    let minor = (amount * BigDecimal::from(100)).round(0);
    match minor.to_i64() {
        Some(value) if value >= 0 => Ok(value),
        _ => Err(DomainError::InvalidState(format!(
            "amount {amount} cannot be charged"
        ))),
    }
}
