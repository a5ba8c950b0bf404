//! HTTP trigger sender.

use async_trait::async_trait;
use ironbot_core::ports::NotificationSender;
use ironbot_core::trigger::NotificationRequest;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<NotifyError> for ironbot_core::Error {
    fn from(err: NotifyError) -> Self {
        ironbot_core::Error::NotificationFailed(err.to_string())
    }
}

/// Sends rebuild triggers as JSON POST requests.
pub struct HttpTriggerSender {
    client: reqwest::Client,
}

impl HttpTriggerSender {
    pub fn new(timeout_seconds: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_seconds))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST one request and check the receiver accepted it.
    pub async fn post(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        debug!(repository = %request.target, "Sending rebuild trigger");

        let mut builder = self.client.post(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        let body = serde_json::to_vec(&request.body)
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        let response = builder.body(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::DeliveryFailed(format!(
                "{} returned {}: {}",
                request.target, status, body
            )));
        }

        info!(repository = %request.target, "Rebuild trigger sent");
        Ok(())
    }
}

impl Default for HttpTriggerSender {
    fn default() -> Self {
        Self::new(30)
    }
}

#[async_trait]
impl NotificationSender for HttpTriggerSender {
    async fn send(&self, request: &NotificationRequest) -> ironbot_core::Result<()> {
        Ok(self.post(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_maps_to_notification_failure() {
        let err: ironbot_core::Error = NotifyError::DeliveryFailed("503".to_string()).into();
        assert!(matches!(err, ironbot_core::Error::NotificationFailed(_)));
    }
}
