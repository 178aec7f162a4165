use bigdecimal::BigDecimal;
use uuid::Uuid;

/// One row of a user's cart, joined with the catalog details needed downstream.
///
/// `unit_price` is the price captured when the item was first added, so a
/// later catalog price change never alters an existing line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub food_item_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl CartLine {
    pub fn line_amount(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// Immutable view over every line a user has in the cart.
///
/// The total is always derived from the lines and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CartAggregate {
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
}

impl CartAggregate {
    pub fn new(user_id: Uuid, lines: Vec<CartLine>) -> Self {
        Self { user_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_amount(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, line| acc + line.line_amount())
    }

    /// Distinct sellers (categories) represented in the cart, in first-seen order.
    pub fn seller_ids(&self) -> Vec<Uuid> {
        let mut sellers: Vec<Uuid> = Vec::new();
        for line in &self.lines {
            if !sellers.contains(&line.category_id) {
                sellers.push(line.category_id);
            }
        }
        sellers
    }
}
