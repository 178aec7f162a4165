use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::domain::errors::DomainError;
use crate::domain::payment::PaymentEvent;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `t=<unix>,v1=<hex>[,v1=<hex>...]`.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Authenticates gateway callbacks before anything in the body is trusted.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance: Duration,
}

struct SignatureHeader<'a> {
    timestamp: &'a str,
    signatures: Vec<Vec<u8>>,
}

impl<'a> SignatureHeader<'a> {
    fn parse(header: &'a str) -> Option<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                // Undecodable candidates just never match.
                Some(("v1", value)) => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }
        let timestamp = timestamp?;
        if signatures.is_empty() {
            return None;
        }
        Some(Self {
            timestamp,
            signatures,
        })
    }
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: Value,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    pub fn verify(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, DomainError> {
        self.verify_at(raw_body, signature_header, Utc::now().timestamp())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock, in unix seconds.
    pub fn verify_at(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<PaymentEvent, DomainError> {
        let header = signature_header
            .and_then(SignatureHeader::parse)
            .ok_or(DomainError::InvalidSignature)?;

        let timestamp: i64 = header
            .timestamp
            .parse()
            .map_err(|_| DomainError::InvalidSignature)?;
        if now.abs_diff(timestamp) > self.tolerance.as_secs() {
            return Err(DomainError::InvalidSignature);
        }

        let mut mac = self.mac()?;
        mac.update(header.timestamp.as_bytes());
        mac.update(b".");
        mac.update(raw_body);

        let matched = header
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
        if !matched {
            return Err(DomainError::InvalidSignature);
        }

        parse_event(raw_body)
    }

    /// Builds a header value the way the gateway signs its deliveries.
    pub fn sign(&self, raw_body: &[u8], timestamp: i64) -> Result<String, DomainError> {
        let mut mac = self.mac()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(raw_body);
        Ok(format!(
            "t={},v1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn mac(&self) -> Result<HmacSha256, DomainError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| DomainError::Internal(format!("webhook secret unusable: {e}")))
    }
}

/// Parses an already-authenticated body into the normalized event.
fn parse_event(raw_body: &[u8]) -> Result<PaymentEvent, DomainError> {
    let envelope: Envelope = serde_json::from_slice(raw_body)
        .map_err(|e| DomainError::InvalidInput(format!("malformed event body: {e}")))?;
    let object = &envelope.data.object;

    // Metadata values are always strings on the wire; anything else is dropped.
    let metadata: BTreeMap<String, String> = object
        .get("metadata")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(PaymentEvent {
        event_id: envelope.id,
        event_type: envelope.event_type,
        payment_reference: object
            .get("payment_intent")
            .and_then(Value::as_str)
            .or_else(|| object.get("id").and_then(Value::as_str))
            .map(str::to_string),
        payment_status: object
            .get("payment_status")
            .and_then(Value::as_str)
            .map(str::to_string),
        amount_total: object.get("amount_total").and_then(Value::as_i64),
        metadata,
    })
}
