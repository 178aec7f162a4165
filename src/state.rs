use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::application::cart_service::CartService;
use crate::application::checkout::{CheckoutConfig, CheckoutOrchestrator};
use crate::application::fulfillment::OrderMaterializer;
use crate::application::order_service::OrderService;
use crate::application::reconciliation::Reconciler;
use crate::application::webhook::WebhookProcessor;
use crate::application::webhook_verifier::WebhookVerifier;
use crate::config::Settings;
use crate::db::DbPool;
use crate::domain::ports::{
    AddressBook, CartStore, Catalog, IdempotencyGuard, NotificationDispatcher, OrderRepository,
    PaymentGateway,
};
use crate::infrastructure::cart_store::DieselCartStore;
use crate::infrastructure::catalog_repo::{DieselAddressBook, DieselCatalog};
use crate::infrastructure::notifier::{HttpNotifier, LogNotifier};
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::payment_event_ledger::DieselPaymentEventLedger;
use crate::infrastructure::stripe_gateway::StripeCheckoutGateway;

/// Outbound notification hooks get a short, fixed budget.
const NOTIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// Adapters behind every port the use cases depend on.
pub struct Ports {
    pub catalog: Arc<dyn Catalog>,
    pub addresses: Arc<dyn AddressBook>,
    pub carts: Arc<dyn CartStore>,
    pub ledger: Arc<dyn IdempotencyGuard>,
    pub orders: Arc<dyn OrderRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

impl Ports {
    /// Postgres adapters plus the HTTP gateway and notifier from `settings`.
    pub fn postgres(pool: DbPool, settings: &Settings) -> io::Result<Self> {
        let gateway = StripeCheckoutGateway::new(
            settings.gateway.base_url.clone(),
            settings.gateway.secret_key.clone(),
            settings.gateway.timeout,
        )
        .map_err(io::Error::other)?;

        let notifier: Arc<dyn NotificationDispatcher> = match &settings.notification_url {
            Some(url) => {
                Arc::new(HttpNotifier::new(url.clone(), NOTIFIER_TIMEOUT).map_err(io::Error::other)?)
            }
            None => Arc::new(LogNotifier),
        };

        Ok(Self {
            catalog: Arc::new(DieselCatalog::new(pool.clone())),
            addresses: Arc::new(DieselAddressBook::new(pool.clone())),
            carts: Arc::new(DieselCartStore::new(pool.clone())),
            ledger: Arc::new(DieselPaymentEventLedger::new(pool.clone())),
            orders: Arc::new(DieselOrderRepository::new(pool)),
            gateway: Arc::new(gateway),
            notifier,
        })
    }
}

/// Use cases shared by every HTTP worker.
pub struct AppState {
    pub carts: CartService,
    pub checkout: CheckoutOrchestrator,
    pub webhooks: WebhookProcessor,
    pub orders: OrderService,
}

impl AppState {
    /// Wires the use cases over `ports`. The reconciler shares the
    /// materializer with the webhook path.
    pub fn assemble(ports: Ports, settings: &Settings) -> (AppState, Reconciler) {
        let materializer = Arc::new(OrderMaterializer::new(
            Arc::clone(&ports.orders),
            Arc::clone(&ports.ledger),
            ports.notifier,
        ));
        let verifier = WebhookVerifier::new(
            settings.webhook.secret.clone(),
            settings.webhook.tolerance,
        );

        let state = AppState {
            carts: CartService::new(Arc::clone(&ports.catalog), Arc::clone(&ports.carts)),
            checkout: CheckoutOrchestrator::new(
                ports.carts,
                ports.catalog,
                ports.addresses,
                ports.gateway,
                CheckoutConfig::from(&settings.gateway),
            ),
            webhooks: WebhookProcessor::new(
                verifier,
                Arc::clone(&ports.ledger),
                Arc::clone(&materializer),
            ),
            orders: OrderService::new(ports.orders),
        };
        let reconciler = Reconciler::new(ports.ledger, materializer, settings.reconcile.clone());

        (state, reconciler)
    }
}
