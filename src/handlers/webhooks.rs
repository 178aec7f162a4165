use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::webhook_verifier::SIGNATURE_HEADER;
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// One of `fulfilled`, `duplicate`, `ignored`, `deferred`.
    pub outcome: String,
}

/// POST /webhooks/payments
///
/// Gateway callback. The raw body is authenticated before it is parsed.
/// Anything that passed verification is acknowledged with 200, including
/// duplicates and failures parked for reconciliation; only signature or
/// body problems (400) and an unrecordable claim (503) ask for redelivery.
#[utoipa::path(
    post,
    path = "/webhooks/payments",
    request_body(content = String, description = "Raw signed event body", content_type = "application/json"),
    params(("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Invalid signature or body"),
        (status = 503, description = "Event could not be recorded, redeliver"),
    ),
    tag = "webhooks"
)]
pub async fn payment_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = match state.webhooks.handle(&body, signature).await {
        Ok(outcome) => outcome,
        Err(DomainError::Internal(msg)) => return Err(AppError::ServiceUnavailable(msg)),
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok().json(WebhookAck {
        received: true,
        outcome: outcome.label().to_string(),
    }))
}
