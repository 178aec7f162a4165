use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartAggregate, CartLine};
use crate::domain::catalog::FoodItem;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartStore;
use crate::schema::{cart_lines, food_items};

use super::models::{CartLineRow, FoodItemRow, NewCartLineRow};

pub struct DieselCartStore {
    pool: DbPool,
}

impl DieselCartStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_cart_line(row: CartLineRow, item: &FoodItem) -> CartLine {
    CartLine {
        food_item_id: row.food_item_id,
        category_id: item.category_id,
        name: item.name.clone(),
        description: item.description.clone(),
        quantity: row.quantity,
        unit_price: row.unit_price,
    }
}

fn joined_line(row: CartLineRow, item: FoodItemRow) -> CartLine {
    CartLine {
        food_item_id: row.food_item_id,
        category_id: item.category_id,
        name: item.name,
        description: item.description,
        quantity: row.quantity,
        unit_price: row.unit_price,
    }
}

impl CartStore for DieselCartStore {
    fn add_item(&self, user_id: Uuid, item: &FoodItem) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        // Single-statement upsert: concurrent adds for the same line serialize
        // on the unique (user_id, food_item_id) index. The stored unit price
        // is left untouched on increment.
        let row = diesel::insert_into(cart_lines::table)
            .values(&NewCartLineRow {
                id: Uuid::new_v4(),
                user_id,
                food_item_id: item.id,
                quantity: 1,
                unit_price: item.price.clone(),
            })
            .on_conflict((cart_lines::user_id, cart_lines::food_item_id))
            .do_update()
            .set((
                cart_lines::quantity.eq(cart_lines::quantity + 1),
                cart_lines::updated_at.eq(Utc::now()),
            ))
            .returning(CartLineRow::as_returning())
            .get_result(&mut conn)?;

        Ok(to_cart_line(row, item))
    }

    fn remove_item(
        &self,
        user_id: Uuid,
        item: &FoodItem,
    ) -> Result<Option<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let line = cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .filter(cart_lines::food_item_id.eq(item.id))
                .select(CartLineRow::as_select())
                .for_update()
                .first(conn)
                .optional()?;

            let Some(line) = line else {
                return Err(DomainError::NotFound("Cart line"));
            };

            match line.quantity {
                q if q <= 0 => Err(DomainError::InvalidState(format!(
                    "cart line for item {} has no quantity left to remove",
                    item.id
                ))),
                1 => {
                    diesel::delete(cart_lines::table.find(line.id)).execute(conn)?;
                    Ok(None)
                }
                _ => {
                    let row = diesel::update(cart_lines::table.find(line.id))
                        .set((
                            cart_lines::quantity.eq(cart_lines::quantity - 1),
                            cart_lines::updated_at.eq(Utc::now()),
                        ))
                        .returning(CartLineRow::as_returning())
                        .get_result(conn)?;
                    Ok(Some(to_cart_line(row, item)))
                }
            }
        })
    }

    fn snapshot(&self, user_id: Uuid) -> Result<CartAggregate, DomainError> {
        let mut conn = self.pool.get()?;

        // One statement, so the snapshot is a single consistent read.
        let rows: Vec<(CartLineRow, FoodItemRow)> = cart_lines::table
            .inner_join(food_items::table)
            .filter(cart_lines::user_id.eq(user_id))
            .order(cart_lines::created_at.asc())
            .select((CartLineRow::as_select(), FoodItemRow::as_select()))
            .load(&mut conn)?;

        Ok(CartAggregate::new(
            user_id,
            rows.into_iter()
                .map(|(line, item)| joined_line(line, item))
                .collect(),
        ))
    }
}

/// Deletes every line of the user's cart and returns what was removed.
///
/// Only order materialization calls this, on its own transaction's
/// connection, so the cart is emptied exactly when the order commits.
pub(crate) fn clear(conn: &mut PgConnection, user_id: Uuid) -> Result<CartAggregate, DomainError> {
    let mut removed: Vec<CartLineRow> =
        diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id)))
            .returning(CartLineRow::as_returning())
            .get_results(conn)?;

    if removed.is_empty() {
        return Ok(CartAggregate::new(user_id, vec![]));
    }
    removed.sort_by_key(|row| row.created_at);

    let ids: Vec<Uuid> = removed.iter().map(|row| row.food_item_id).collect();
    let mut items: HashMap<Uuid, FoodItemRow> = food_items::table
        .filter(food_items::id.eq_any(ids))
        .select(FoodItemRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let lines = removed
        .into_iter()
        .map(|row| {
            let item = items.remove(&row.food_item_id).ok_or_else(|| {
                DomainError::Internal(format!("food item {} vanished", row.food_item_id))
            })?;
            Ok(joined_line(row, item))
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    Ok(CartAggregate::new(user_id, lines))
}
