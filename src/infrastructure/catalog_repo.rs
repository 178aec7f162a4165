use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Address, FoodItem};
use crate::domain::errors::DomainError;
use crate::domain::ports::{AddressBook, Catalog};
use crate::schema::{addresses, food_items, seller_payment_accounts};

use super::models::{AddressRow, FoodItemRow};

/// Read-only access to the catalog and seller payment accounts.
pub struct DieselCatalog {
    pool: DbPool,
}

impl DieselCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<FoodItemRow> for FoodItem {
    fn from(row: FoodItemRow) -> Self {
        FoodItem {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            price: row.price,
        }
    }
}

impl Catalog for DieselCatalog {
    fn find_food_item(&self, id: Uuid) -> Result<Option<FoodItem>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = food_items::table
            .filter(food_items::id.eq(id))
            .select(FoodItemRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(FoodItem::from))
    }

    fn destination_account(&self, category_id: Uuid) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;

        let account = seller_payment_accounts::table
            .filter(seller_payment_accounts::category_id.eq(category_id))
            .select(seller_payment_accounts::account_id)
            .first::<String>(&mut conn)
            .optional()?;

        Ok(account.filter(|id| !id.trim().is_empty()))
    }
}

pub struct DieselAddressBook {
    pool: DbPool,
}

impl DieselAddressBook {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AddressBook for DieselAddressBook {
    fn find_for_user(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = addresses::table
            .filter(addresses::id.eq(address_id))
            .filter(addresses::user_id.eq(user_id))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|a| Address {
            id: a.id,
            user_id: a.user_id,
            area: a.area,
            label: a.label,
        }))
    }
}
