use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderView};
use crate::domain::ports::OrderRepository;

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    pub fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.repo.find_for_user(user_id, id)
    }

    pub fn list_orders(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.repo.list_for_user(user_id, page, limit)
    }
}
