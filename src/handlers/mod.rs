pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod webhooks;

use actix_web::web;
use bigdecimal::BigDecimal;

/// Money is rendered as a two-decimal string to avoid floating-point issues.
pub(crate) fn money(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

/// Registers every route on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(cart::get_cart))
            .route("/items/{food_item_id}", web::post().to(cart::add_item))
            .route("/items/{food_item_id}", web::delete().to(cart::remove_item)),
    )
    .route("/checkout", web::post().to(checkout::create_checkout))
    .route("/webhooks/payments", web::post().to(webhooks::payment_webhook))
    .service(
        web::scope("/orders")
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order)),
    );
}
