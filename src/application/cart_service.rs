use std::sync::Arc;

use uuid::Uuid;

use crate::domain::cart::{CartAggregate, CartLine};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartStore, Catalog};

/// Result of a single cart mutation: the touched line (if it still exists)
/// and the cart as it stands afterwards.
#[derive(Debug, Clone)]
pub struct CartMutation {
    pub line: Option<CartLine>,
    pub cart: CartAggregate,
}

pub struct CartService {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn CartStore>) -> Self {
        Self { catalog, store }
    }

    pub fn add_item(&self, user_id: Uuid, food_item_id: Uuid) -> Result<CartMutation, DomainError> {
        let item = self
            .catalog
            .find_food_item(food_item_id)?
            .ok_or(DomainError::NotFound("Food item"))?;
        let line = self.store.add_item(user_id, &item)?;
        log::debug!("User {} now has {} x {}", user_id, line.quantity, item.id);

        Ok(CartMutation {
            line: Some(line),
            cart: self.store.snapshot(user_id)?,
        })
    }

    pub fn remove_item(
        &self,
        user_id: Uuid,
        food_item_id: Uuid,
    ) -> Result<CartMutation, DomainError> {
        let item = self
            .catalog
            .find_food_item(food_item_id)?
            .ok_or(DomainError::NotFound("Food item"))?;
        let line = self.store.remove_item(user_id, &item)?;

        Ok(CartMutation {
            line,
            cart: self.store.snapshot(user_id)?,
        })
    }

    pub fn view(&self, user_id: Uuid) -> Result<CartAggregate, DomainError> {
        self.store.snapshot(user_id)
    }
}
