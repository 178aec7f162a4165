use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Checkout Service",
        version = "0.1.0",
        description = "Cart, hosted checkout and payment-confirmed order placement."
    ),
    paths(
        handlers::cart::get_cart,
        handlers::cart::add_item,
        handlers::cart::remove_item,
        handlers::checkout::create_checkout,
        handlers::webhooks::payment_webhook,
        handlers::orders::list_orders,
        handlers::orders::get_order,
    ),
    components(schemas(
        handlers::cart::CartLineResponse,
        handlers::cart::CartResponse,
        handlers::cart::CartMutationResponse,
        handlers::checkout::CheckoutRequest,
        handlers::checkout::CheckoutResponse,
        handlers::webhooks::WebhookAck,
        handlers::orders::OrderLineResponse,
        handlers::orders::DeliveryAddressResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags(
        (name = "cart", description = "Per-user cart"),
        (name = "checkout", description = "Hosted payment sessions"),
        (name = "webhooks", description = "Payment gateway callbacks"),
        (name = "orders", description = "Placed orders"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}
