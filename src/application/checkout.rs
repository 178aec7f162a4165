use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::GatewaySettings;
use crate::domain::cart::CartAggregate;
use crate::domain::errors::DomainError;
use crate::domain::payment::{
    to_minor_units, CheckoutSession, CheckoutSessionRequest, GatewayLineItem,
    METADATA_ADDRESS_ID, METADATA_DESTINATION, METADATA_USER_ID,
};
use crate::domain::ports::{AddressBook, CartStore, Catalog, PaymentGateway};

use super::blocking;

/// Static parameters of every hosted checkout page this service opens.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub timeout: Duration,
}

impl From<&GatewaySettings> for CheckoutConfig {
    fn from(settings: &GatewaySettings) -> Self {
        Self {
            currency: settings.currency.clone(),
            success_url: settings.success_url.clone(),
            cancel_url: settings.cancel_url.clone(),
            timeout: settings.timeout,
        }
    }
}

/// Opens a gateway checkout session for the caller's current cart.
///
/// Nothing local is written here: the cart stays as-is until a verified
/// payment confirmation materializes it into an order.
pub struct CheckoutOrchestrator {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn Catalog>,
    addresses: Arc<dyn AddressBook>,
    gateway: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
}

struct PreparedCheckout {
    cart: CartAggregate,
    destination_account: String,
}

impl CheckoutOrchestrator {
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn Catalog>,
        addresses: Arc<dyn AddressBook>,
        gateway: Arc<dyn PaymentGateway>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            carts,
            catalog,
            addresses,
            gateway,
            config,
        }
    }

    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<CheckoutSession, DomainError> {
        let carts = Arc::clone(&self.carts);
        let catalog = Arc::clone(&self.catalog);
        let addresses = Arc::clone(&self.addresses);
        let prepared =
            blocking(move || prepare(&*carts, &*catalog, &*addresses, user_id, address_id))
                .await?;

        let request = self.session_request(&prepared, address_id)?;

        // No lock is held across the gateway round trip.
        let session = match tokio::time::timeout(
            self.config.timeout,
            self.gateway.create_session(&request),
        )
        .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                log::warn!("Checkout session for user {} failed: {}", user_id, e);
                return Err(DomainError::PaymentGatewayUnavailable(e.to_string()));
            }
            Err(_) => {
                log::warn!(
                    "Checkout session for user {} timed out after {:?}",
                    user_id,
                    self.config.timeout
                );
                return Err(DomainError::PaymentGatewayUnavailable(format!(
                    "no response within {:?}",
                    self.config.timeout
                )));
            }
        };

        log::info!(
            "Opened checkout session {} for user {} ({} line(s), total {})",
            session.id,
            user_id,
            prepared.cart.item_count(),
            prepared.cart.total_amount()
        );
        Ok(session)
    }

    fn session_request(
        &self,
        prepared: &PreparedCheckout,
        address_id: Uuid,
    ) -> Result<CheckoutSessionRequest, DomainError> {
        let line_items = prepared
            .cart
            .lines
            .iter()
            .map(|line| {
                Ok(GatewayLineItem {
                    name: line.name.clone(),
                    description: line.description.clone(),
                    unit_amount: to_minor_units(&line.unit_price)?,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let metadata = BTreeMap::from([
            (METADATA_USER_ID.to_string(), prepared.cart.user_id.to_string()),
            (METADATA_ADDRESS_ID.to_string(), address_id.to_string()),
            (
                METADATA_DESTINATION.to_string(),
                prepared.destination_account.clone(),
            ),
        ]);

        Ok(CheckoutSessionRequest {
            currency: self.config.currency.clone(),
            line_items,
            destination_account: prepared.destination_account.clone(),
            metadata,
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        })
    }
}

fn prepare(
    carts: &dyn CartStore,
    catalog: &dyn Catalog,
    addresses: &dyn AddressBook,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<PreparedCheckout, DomainError> {
    let cart = carts.snapshot(user_id)?;
    if cart.is_empty() {
        return Err(DomainError::EmptyCart);
    }

    addresses
        .find_for_user(user_id, address_id)?
        .ok_or(DomainError::NotFound("Address"))?;

    let sellers = cart.seller_ids();
    let seller = match sellers.as_slice() {
        [seller] => *seller,
        _ => {
            return Err(DomainError::InvalidState(format!(
                "cart spans {} sellers; a checkout pays exactly one",
                sellers.len()
            )))
        }
    };

    let destination_account = catalog
        .destination_account(seller)?
        .ok_or(DomainError::PaymentNotConfigured)?;

    Ok(PreparedCheckout {
        cart,
        destination_account,
    })
}
