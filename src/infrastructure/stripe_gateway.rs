use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::payment::{CheckoutSession, CheckoutSessionRequest};
use crate::domain::ports::{GatewayError, PaymentGateway};

/// Checkout sessions endpoint path.
const SESSIONS_PATH: &str = "/v1/checkout/sessions";

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Stripe-compatible hosted checkout client using destination charges.
#[derive(Debug, Clone)]
pub struct StripeCheckoutGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeCheckoutGateway {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

/// Flattens a session request into the gateway's bracketed form fields.
fn form_fields(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "payment_intent_data[transfer_data][destination]".to_string(),
            request.destination_account.clone(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        fields.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.clone(),
        ));
        fields.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        fields.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if !item.description.is_empty() {
            fields.push((
                format!("{prefix}[price_data][product_data][description]"),
                item.description.clone(),
            ));
        }
        fields.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (key, value) in &request.metadata {
        fields.push((format!("metadata[{key}]"), value.clone()));
    }

    fields
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let url = format!("{}{SESSIONS_PATH}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form_fields(request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        let url = session
            .url
            .ok_or_else(|| GatewayError::Decode(format!("session {} has no url", session.id)))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
