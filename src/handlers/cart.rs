use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::CartMutation;
use crate::domain::cart::{CartAggregate, CartLine};
use crate::errors::AppError;
use crate::AppState;

use super::auth::AuthenticatedUser;
use super::money;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub food_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub total_amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartMutationResponse {
    /// The touched line, or `null` once its last unit was removed.
    pub line: Option<CartLineResponse>,
    pub total_amount: String,
}

impl From<&CartLine> for CartLineResponse {
    fn from(line: &CartLine) -> Self {
        Self {
            food_item_id: line.food_item_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: money(&line.unit_price),
            line_amount: money(&line.line_amount()),
        }
    }
}

impl From<&CartAggregate> for CartResponse {
    fn from(cart: &CartAggregate) -> Self {
        Self {
            lines: cart.lines.iter().map(CartLineResponse::from).collect(),
            total_amount: money(&cart.total_amount()),
        }
    }
}

impl From<&CartMutation> for CartMutationResponse {
    fn from(mutation: &CartMutation) -> Self {
        Self {
            line: mutation.line.as_ref().map(CartLineResponse::from),
            total_amount: money(&mutation.cart.total_amount()),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Current cart with computed total", body = CartResponse),
        (status = 401, description = "Missing caller identity"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || state.carts.view(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(&cart)))
}

/// POST /cart/items/{food_item_id}
///
/// Adds one unit. A new line takes the item's current catalog price.
#[utoipa::path(
    post,
    path = "/cart/items/{food_item_id}",
    params(
        ("food_item_id" = Uuid, Path, description = "Food item UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated caller"),
    ),
    responses(
        (status = 200, description = "Updated line and cart total", body = CartMutationResponse),
        (status = 404, description = "Food item not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let food_item_id = path.into_inner();

    let mutation = web::block(move || state.carts.add_item(user.0, food_item_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartMutationResponse::from(&mutation)))
}

/// DELETE /cart/items/{food_item_id}
///
/// Removes one unit; the line disappears when its last unit goes.
#[utoipa::path(
    delete,
    path = "/cart/items/{food_item_id}",
    params(
        ("food_item_id" = Uuid, Path, description = "Food item UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated caller"),
    ),
    responses(
        (status = 200, description = "Updated line (or null) and cart total", body = CartMutationResponse),
        (status = 404, description = "Item not in cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let food_item_id = path.into_inner();

    let mutation = web::block(move || state.carts.remove_item(user.0, food_item_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartMutationResponse::from(&mutation)))
}
