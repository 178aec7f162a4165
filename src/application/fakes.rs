//! In-memory port implementations for use-case and handler tests.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::cart::{CartAggregate, CartLine};
use crate::domain::catalog::{Address, FoodItem};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    AddressSnapshot, ListResult, Materialized, OrderLineView, OrderSummary, OrderView,
};
use crate::domain::payment::{
    CheckoutRefs, CheckoutSession, CheckoutSessionRequest, Claim, PaymentEvent,
};
use crate::domain::ports::{
    AddressBook, CartStore, Catalog, GatewayError, IdempotencyGuard, NotificationDispatcher,
    NotificationError, OrderRepository, PaymentGateway,
};
use crate::state::{AppState, Ports};

pub fn food_item(category_id: Uuid, name: &str, price: &str) -> FoodItem {
    FoodItem {
        id: Uuid::new_v4(),
        category_id,
        name: name.to_string(),
        description: String::new(),
        price: BigDecimal::from_str(price).expect("valid decimal"),
    }
}

// ── Catalog / addresses ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCatalog {
    items: Mutex<HashMap<Uuid, FoodItem>>,
    accounts: Mutex<HashMap<Uuid, String>>,
}

impl InMemoryCatalog {
    pub fn add_item(&self, item: FoodItem) -> FoodItem {
        self.items.lock().unwrap().insert(item.id, item.clone());
        item
    }

    pub fn set_account(&self, category_id: Uuid, account_id: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(category_id, account_id.to_string());
    }
}

impl Catalog for InMemoryCatalog {
    fn find_food_item(&self, id: Uuid) -> Result<Option<FoodItem>, DomainError> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    fn destination_account(&self, category_id: Uuid) -> Result<Option<String>, DomainError> {
        Ok(self.accounts.lock().unwrap().get(&category_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAddressBook {
    addresses: Mutex<Vec<Address>>,
}

impl InMemoryAddressBook {
    pub fn add_for(&self, user_id: Uuid) -> Address {
        let address = Address {
            id: Uuid::new_v4(),
            user_id,
            area: "12 MG Road".to_string(),
            label: "Home".to_string(),
        };
        self.addresses.lock().unwrap().push(address.clone());
        address
    }
}

impl AddressBook for InMemoryAddressBook {
    fn find_for_user(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, DomainError> {
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == address_id && a.user_id == user_id)
            .cloned())
    }
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: Mutex<HashMap<Uuid, Vec<CartLine>>>,
}

impl InMemoryCartStore {
    pub fn take(&self, user_id: Uuid) -> CartAggregate {
        let lines = self
            .carts
            .lock()
            .unwrap()
            .remove(&user_id)
            .unwrap_or_default();
        CartAggregate::new(user_id, lines)
    }
}

impl CartStore for InMemoryCartStore {
    fn add_item(&self, user_id: Uuid, item: &FoodItem) -> Result<CartLine, DomainError> {
        let mut carts = self.carts.lock().unwrap();
        let lines = carts.entry(user_id).or_default();
        if let Some(line) = lines.iter_mut().find(|l| l.food_item_id == item.id) {
            line.quantity += 1;
            return Ok(line.clone());
        }
        let line = CartLine {
            food_item_id: item.id,
            category_id: item.category_id,
            name: item.name.clone(),
            description: item.description.clone(),
            quantity: 1,
            unit_price: item.price.clone(),
        };
        lines.push(line.clone());
        Ok(line)
    }

    fn remove_item(
        &self,
        user_id: Uuid,
        item: &FoodItem,
    ) -> Result<Option<CartLine>, DomainError> {
        let mut carts = self.carts.lock().unwrap();
        let lines = carts.entry(user_id).or_default();
        let pos = lines
            .iter()
            .position(|l| l.food_item_id == item.id)
            .ok_or(DomainError::NotFound("Cart line"))?;
        if lines[pos].quantity > 1 {
            lines[pos].quantity -= 1;
            Ok(Some(lines[pos].clone()))
        } else {
            lines.remove(pos);
            Ok(None)
        }
    }

    fn snapshot(&self, user_id: Uuid) -> Result<CartAggregate, DomainError> {
        let lines = self
            .carts
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        Ok(CartAggregate::new(user_id, lines))
    }
}

// ── Idempotency ledger ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    Claimed,
    Fulfilled,
    Failed,
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    event: PaymentEvent,
    status: LedgerStatus,
    attempts: i32,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    entries: Mutex<HashMap<String, LedgerEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryLedger {
    pub fn status(&self, event_id: &str) -> Option<LedgerStatus> {
        self.entries
            .lock()
            .unwrap()
            .get(event_id)
            .map(|e| e.status)
    }

    pub fn attempts(&self, event_id: &str) -> i32 {
        self.entries
            .lock()
            .unwrap()
            .get(event_id)
            .map_or(0, |e| e.attempts)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Marks the claim as fulfilled; false when it was already fulfilled.
    fn fulfil(&self, event_id: &str) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .get_mut(event_id)
            .ok_or_else(|| DomainError::InvalidState(format!("event {event_id} was never claimed")))?;
        if entry.status == LedgerStatus::Fulfilled {
            return Ok(false);
        }
        entry.status = LedgerStatus::Fulfilled;
        entry.updated_at = Utc::now();
        Ok(true)
    }
}

impl IdempotencyGuard for InMemoryLedger {
    fn claim(&self, event: &PaymentEvent) -> Result<Claim, DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("connection refused".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&event.event_id) {
            return Ok(Claim::AlreadyProcessed);
        }
        entries.insert(
            event.event_id.clone(),
            LedgerEntry {
                event: event.clone(),
                status: LedgerStatus::Claimed,
                attempts: 0,
                updated_at: Utc::now(),
            },
        );
        Ok(Claim::FirstSeen)
    }

    fn record_failure(&self, event_id: &str, _error: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(event_id) {
            if entry.status != LedgerStatus::Fulfilled {
                entry.status = LedgerStatus::Failed;
                entry.attempts += 1;
                entry.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    fn pending_reconciliation(
        &self,
        stale_after: Duration,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PaymentEvent>, DomainError> {
        let cutoff = Utc::now() - chrono::Duration::from_std(stale_after).unwrap();
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .values()
            .filter(|e| match e.status {
                LedgerStatus::Failed => e.attempts < max_attempts,
                LedgerStatus::Claimed => e.updated_at < cutoff,
                LedgerStatus::Fulfilled => false,
            })
            .take(limit as usize)
            .map(|e| e.event.clone())
            .collect())
    }

    fn purge_fulfilled_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, e| !(e.status == LedgerStatus::Fulfilled && e.updated_at < cutoff));
        Ok(before - entries.len())
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

/// Mirrors the transactional repository: takes the live cart, writes the
/// order and flips the ledger entry in one critical section.
pub struct InMemoryOrderRepository {
    carts: Arc<InMemoryCartStore>,
    addresses: Arc<InMemoryAddressBook>,
    ledger: Arc<InMemoryLedger>,
    orders: Mutex<Vec<OrderView>>,
    failing: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn new(
        carts: Arc<InMemoryCartStore>,
        addresses: Arc<InMemoryAddressBook>,
        ledger: Arc<InMemoryLedger>,
    ) -> Self {
        Self {
            carts,
            addresses,
            ledger,
            orders: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn insert(&self, order: OrderView) {
        self.orders.lock().unwrap().push(order);
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn materialize(
        &self,
        event: &PaymentEvent,
        refs: CheckoutRefs,
    ) -> Result<Materialized, DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("deadlock detected".to_string()));
        }
        let mut orders = self.orders.lock().unwrap();
        match self.ledger.status(&event.event_id) {
            None => {
                return Err(DomainError::InvalidState(format!(
                    "event {} was never claimed",
                    event.event_id
                )))
            }
            Some(LedgerStatus::Fulfilled) => return Ok(Materialized::AlreadyFulfilled),
            Some(_) => {}
        }
        let address = self
            .addresses
            .find_for_user(refs.user_id, refs.address_id)?
            .ok_or(DomainError::NotFound("Address"))?;
        let cart = self.carts.take(refs.user_id);
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        if !self.ledger.fulfil(&event.event_id)? {
            return Ok(Materialized::AlreadyFulfilled);
        }

        let order = OrderView {
            id: Uuid::new_v4(),
            user_id: refs.user_id,
            payment_event_id: event.event_id.clone(),
            payment_reference: event.payment_reference.clone(),
            address: AddressSnapshot {
                address_id: address.id,
                area: address.area,
                label: address.label,
            },
            active: true,
            placed_at: Utc::now(),
            lines: cart
                .lines
                .into_iter()
                .map(|l| OrderLineView {
                    id: Uuid::new_v4(),
                    food_item_id: l.food_item_id,
                    name: l.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
        };
        orders.push(order.clone());
        Ok(Materialized::Created(order))
    }

    fn find_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == order_id && o.user_id == user_id)
            .cloned())
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut mine: Vec<OrderView> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }
}

// ── Gateway / notifier ───────────────────────────────────────────────────────

pub enum GatewayBehaviour {
    Succeed,
    Reject,
    Hang,
}

pub struct RecordingGateway {
    behaviour: GatewayBehaviour,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl RecordingGateway {
    pub fn new(behaviour: GatewayBehaviour) -> Self {
        Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behaviour {
            GatewayBehaviour::Succeed => Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: "https://checkout.example/c/pay/cs_test_1".to_string(),
            }),
            GatewayBehaviour::Reject => Err(GatewayError::Rejected {
                status: 400,
                message: "invalid destination".to_string(),
            }),
            GatewayBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(GatewayError::Transport("unreachable".to_string()))
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Uuid, OrderSummary)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(true),
        }
    }

    pub fn sent(&self) -> Vec<(Uuid, OrderSummary)> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for the spawned notification task to run.
    pub async fn wait_for(&self, count: usize) -> Vec<(Uuid, OrderSummary)> {
        for _ in 0..100 {
            if self.sent().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify(&self, user_id: Uuid, summary: &OrderSummary) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((user_id, summary.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("hook offline".to_string()));
        }
        Ok(())
    }
}

// ── Whole-service wiring ─────────────────────────────────────────────────────

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

pub fn test_settings() -> Settings {
    let env = HashMap::from([
        ("DATABASE_URL", "postgres://unused"),
        ("PAYMENT_GATEWAY_SECRET_KEY", "sk_test"),
        ("PAYMENT_WEBHOOK_SECRET", TEST_WEBHOOK_SECRET),
        ("PAYMENT_GATEWAY_TIMEOUT_MS", "200"),
        ("CHECKOUT_SUCCESS_URL", "https://shop.example/my-account"),
        ("CHECKOUT_CANCEL_URL", "https://shop.example/cart"),
    ]);
    Settings::from_lookup(|name| env.get(name).map(|v| v.to_string())).expect("test settings")
}

/// Every port faked in memory, with handles kept for assertions.
pub struct FakeWorld {
    pub catalog: Arc<InMemoryCatalog>,
    pub addresses: Arc<InMemoryAddressBook>,
    pub carts: Arc<InMemoryCartStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub orders: Arc<InMemoryOrderRepository>,
    pub gateway: Arc<RecordingGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for FakeWorld {
    fn default() -> Self {
        Self::with_gateway(GatewayBehaviour::Succeed)
    }
}

impl FakeWorld {
    pub fn with_gateway(behaviour: GatewayBehaviour) -> Self {
        let carts = Arc::new(InMemoryCartStore::default());
        let addresses = Arc::new(InMemoryAddressBook::default());
        let ledger = Arc::new(InMemoryLedger::default());
        let orders = Arc::new(InMemoryOrderRepository::new(
            carts.clone(),
            addresses.clone(),
            ledger.clone(),
        ));
        Self {
            catalog: Arc::new(InMemoryCatalog::default()),
            addresses,
            carts,
            ledger,
            orders,
            gateway: Arc::new(RecordingGateway::new(behaviour)),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn state(&self) -> AppState {
        let ports = Ports {
            catalog: self.catalog.clone(),
            addresses: self.addresses.clone(),
            carts: self.carts.clone(),
            ledger: self.ledger.clone(),
            orders: self.orders.clone(),
            gateway: self.gateway.clone(),
            notifier: self.notifier.clone(),
        };
        AppState::assemble(ports, &test_settings()).0
    }
}
