use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::AppState;

use super::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub address_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    /// Gateway-hosted payment page to redirect the buyer to.
    pub checkout_url: String,
    pub session_id: String,
}

/// POST /checkout
///
/// Opens a hosted payment page for the caller's cart. The cart is only
/// turned into an order once the gateway confirms payment.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Checkout session opened", body = CheckoutResponse),
        (status = 404, description = "Address not found"),
        (status = 409, description = "Cart spans more than one seller"),
        (status = 412, description = "Seller has not enabled payments"),
        (status = 422, description = "Cart is empty"),
        (status = 503, description = "Payment gateway unavailable"),
    ),
    tag = "checkout"
)]
pub async fn create_checkout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .checkout
        .create_checkout(user.0, body.address_id)
        .await?;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        checkout_url: session.url,
        session_id: session.id,
    }))
}
