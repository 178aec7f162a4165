use bigdecimal::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct FoodItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub area: String,
    pub label: String,
}
