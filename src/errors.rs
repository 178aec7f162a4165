use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("seller has not enabled payments")]
    PaymentNotConfigured,

    #[error("Payment gateway unavailable, please retry")]
    GatewayUnavailable(String),

    #[error("Service temporarily unavailable")]
    ServiceUnavailable(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing or invalid caller identity")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code clients switch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "INVALID_STATE",
            AppError::EmptyCart => "EMPTY_CART",
            AppError::PaymentNotConfigured => "PAYMENT_NOT_CONFIGURED",
            AppError::GatewayUnavailable(_) => "PAYMENT_GATEWAY_UNAVAILABLE",
            AppError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::InvalidState(msg) => AppError::Conflict(msg),
            DomainError::EmptyCart => AppError::EmptyCart,
            DomainError::PaymentNotConfigured => AppError::PaymentNotConfigured,
            DomainError::PaymentGatewayUnavailable(msg) => AppError::GatewayUnavailable(msg),
            DomainError::InvalidSignature => AppError::InvalidSignature,
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::CorruptEvent(msg) | DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PaymentNotConfigured => StatusCode::PRECONDITION_FAILED,
            AppError::GatewayUnavailable(_) | AppError::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::InvalidSignature | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
            AppError::GatewayUnavailable(detail) | AppError::ServiceUnavailable(detail) => {
                log::warn!("Dependency unavailable: {}", detail);
                self.to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_errors_map_to_distinct_statuses() {
        let cases = [
            (DomainError::NotFound("Address"), StatusCode::NOT_FOUND),
            (
                DomainError::InvalidState("qty".to_string()),
                StatusCode::CONFLICT,
            ),
            (DomainError::EmptyCart, StatusCode::UNPROCESSABLE_ENTITY),
            (
                DomainError::PaymentNotConfigured,
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                DomainError::PaymentGatewayUnavailable("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (DomainError::InvalidSignature, StatusCode::BAD_REQUEST),
            (
                DomainError::InvalidInput("bad json".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::CorruptEvent("no metadata".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (domain, status) in cases {
            let app: AppError = domain.into();
            assert_eq!(app.status_code(), status, "{app:?}");
        }
    }

    #[test]
    fn domain_not_found_keeps_entity_name() {
        let app_err: AppError = DomainError::NotFound("Food item").into();
        assert_eq!(app_err.to_string(), "Food item not found");
    }

    #[actix_web::test]
    async fn payment_not_configured_is_user_facing() {
        let body = body_json(DomainError::PaymentNotConfigured.into()).await;
        assert_eq!(body["code"], "PAYMENT_NOT_CONFIGURED");
        assert_eq!(body["error"], "seller has not enabled payments");
    }

    #[actix_web::test]
    async fn internal_details_are_not_leaked() {
        let body = body_json(AppError::Internal("password=hunter2".to_string())).await;
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["error"], "Internal server error");
    }
}
