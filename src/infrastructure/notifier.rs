use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::domain::order::OrderSummary;
use crate::domain::ports::{NotificationDispatcher, NotificationError};

/// Writes the confirmation to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn notify(&self, user_id: Uuid, summary: &OrderSummary) -> Result<(), NotificationError> {
        log::info!("Notify user {}: {}", user_id, summary.message());
        Ok(())
    }
}

/// Posts the confirmation as JSON to an external messaging hook.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotifier {
    async fn notify(&self, user_id: Uuid, summary: &OrderSummary) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "user_id": user_id,
                "message": summary.message(),
                "order": summary,
            }))
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Delivery(format!(
                "hook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}
