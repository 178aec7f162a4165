use chrono::{SubsecRound, Utc};
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{AddressSnapshot, ListResult, Materialized, OrderLineView, OrderView};
use crate::domain::payment::{CheckoutRefs, PaymentEvent};
use crate::domain::ports::OrderRepository;
use crate::schema::{addresses, order_lines, order_outbox, orders, payment_events};

use super::cart_store;
use super::models::{
    AddressRow, EventStatus, NewOrderLineRow, NewOrderRow, NewOutboxEventRow, OrderLineRow,
    OrderRow,
};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(order: OrderRow, lines: Vec<OrderLineRow>) -> OrderView {
    OrderView {
        id: order.id,
        user_id: order.user_id,
        payment_event_id: order.payment_event_id,
        payment_reference: order.payment_reference,
        address: AddressSnapshot {
            address_id: order.address_id,
            area: order.address_area,
            label: order.address_label,
        },
        active: order.active,
        placed_at: order.placed_at,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                food_item_id: l.food_item_id,
                name: l.name,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect(),
    }
}

impl OrderRepository for DieselOrderRepository {
    fn materialize(
        &self,
        event: &PaymentEvent,
        refs: CheckoutRefs,
    ) -> Result<Materialized, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the ledger row. Webhook delivery and reconciliation may
            //    race on the same event; the lock holder decides.
            let status = payment_events::table
                .filter(payment_events::event_id.eq(&event.event_id))
                .select(payment_events::status)
                .for_update()
                .first::<String>(conn)
                .optional()?;

            match status.as_deref() {
                None => {
                    return Err(DomainError::InvalidState(format!(
                        "payment event {} was never claimed",
                        event.event_id
                    )))
                }
                Some(s) if s == EventStatus::Fulfilled.as_str() => {
                    return Ok(Materialized::AlreadyFulfilled)
                }
                Some(_) => {}
            }

            // 2. Snapshot the delivery address into the order.
            let address = addresses::table
                .filter(addresses::id.eq(refs.address_id))
                .filter(addresses::user_id.eq(refs.user_id))
                .select(AddressRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound("Address"))?;

            // 3. Take the live cart; it is cleared by the same statement.
            let cart = cart_store::clear(conn, refs.user_id)?;
            if cart.is_empty() {
                return Err(DomainError::EmptyCart);
            }

            // 4. Insert the order and its line snapshot
            let order_id = Uuid::new_v4();
            let placed_at = Utc::now().trunc_subsecs(6);
            let new_order = NewOrderRow {
                id: order_id,
                user_id: refs.user_id,
                payment_event_id: event.event_id.clone(),
                payment_reference: event.payment_reference.clone(),
                address_id: address.id,
                address_area: address.area.clone(),
                address_label: address.label.clone(),
                active: true,
                placed_at,
            };
            diesel::insert_into(orders::table)
                .values(&new_order)
                .execute(conn)?;

            let new_lines: Vec<NewOrderLineRow> = cart
                .lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    food_item_id: l.food_item_id,
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            // 5. Outbox event in the same transaction, for CDC consumers.
            let line_payloads: Vec<serde_json::Value> = new_lines
                .iter()
                .map(|l| {
                    json!({
                        "food_item_id": l.food_item_id,
                        "name": l.name,
                        "quantity": l.quantity,
                        "unit_price": l.unit_price.to_string()
                    })
                })
                .collect();

            diesel::insert_into(order_outbox::table)
                .values(&NewOutboxEventRow {
                    id: Uuid::new_v4(),
                    aggregate_type: "Order".to_string(),
                    aggregate_id: order_id.to_string(),
                    event_type: "OrderPlaced".to_string(),
                    payload: json!({
                        "order_id": order_id,
                        "user_id": refs.user_id,
                        "payment_event_id": event.event_id,
                        "payment_reference": event.payment_reference,
                        "transfer_destination": event.transfer_destination(),
                        "address": { "area": address.area, "label": address.label },
                        "total_amount": cart.total_amount().to_string(),
                        "lines": line_payloads
                    }),
                })
                .execute(conn)?;

            // 6. Close out the ledger entry.
            diesel::update(payment_events::table.filter(payment_events::event_id.eq(&event.event_id)))
                .set((
                    payment_events::status.eq(EventStatus::Fulfilled.as_str()),
                    payment_events::order_id.eq(Some(order_id)),
                    payment_events::last_error.eq(None::<String>),
                    payment_events::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            Ok(Materialized::Created(OrderView {
                id: order_id,
                user_id: refs.user_id,
                payment_event_id: event.event_id.clone(),
                payment_reference: event.payment_reference.clone(),
                address: AddressSnapshot {
                    address_id: address.id,
                    area: address.area,
                    label: address.label,
                },
                active: true,
                placed_at,
                lines: new_lines
                    .into_iter()
                    .map(|l| OrderLineView {
                        id: l.id,
                        food_item_id: l.food_item_id,
                        name: l.name,
                        quantity: l.quantity,
                        unit_price: l.unit_price,
                    })
                    .collect(),
            }))
        })
    }

    fn find_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order.id))
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;

        Ok(Some(to_view(order, lines)))
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order(orders::placed_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let lines = OrderLineRow::belonging_to(&rows)
                .select(OrderLineRow::as_select())
                .load(conn)?
                .grouped_by(&rows);

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .zip(lines)
                    .map(|(order, lines)| to_view(order, lines))
                    .collect(),
                total,
            })
        })
    }
}
