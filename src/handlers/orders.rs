use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{OrderLineView, OrderView};
use crate::errors::AppError;
use crate::AppState;

use super::auth::AuthenticatedUser;
use super::money;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub food_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryAddressResponse {
    pub address_id: Uuid,
    pub area: String,
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub payment_reference: Option<String>,
    pub address: DeliveryAddressResponse,
    pub active: bool,
    pub placed_at: String,
    pub total_amount: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<&OrderLineView> for OrderLineResponse {
    fn from(line: &OrderLineView) -> Self {
        Self {
            id: line.id,
            food_item_id: line.food_item_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: money(&line.unit_price),
            line_amount: money(&line.line_amount()),
        }
    }
}

impl From<&OrderView> for OrderResponse {
    fn from(order: &OrderView) -> Self {
        Self {
            id: order.id,
            payment_reference: order.payment_reference.clone(),
            address: DeliveryAddressResponse {
                address_id: order.address.address_id,
                area: order.address.area.clone(),
                label: order.address.label.clone(),
            },
            active: order.active,
            placed_at: order.placed_at.to_rfc3339(),
            total_amount: money(&order.total_amount()),
            lines: order.lines.iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders/{id}
///
/// Returns one of the caller's orders together with its lines.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated caller"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = web::block(move || state.orders.get_order(user.0, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(&order))),
        None => Err(AppError::NotFound("Order not found".to_string())),
    }
}

/// GET /orders
///
/// Returns a paginated list of the caller's orders, newest first.
/// Use `page` (1-based) and `limit` to control pagination.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated caller"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || state.orders.list_orders(user.0, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
