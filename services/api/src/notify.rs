use clinic_compliance::workflows::refresh::RefreshAlert;
use serde_json::json;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug)]
pub(crate) enum NotifyError {
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Request(err) => write!(f, "webhook request failed: {err}"),
            NotifyError::Status(status) => write!(f, "webhook responded with {status}"),
        }
    }
}

impl std::error::Error for NotifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NotifyError::Request(err) => Some(err),
            NotifyError::Status(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Logged,
    Webhook,
}

/// Hands refresh alerts to the log and, when configured, a chat-style webhook
/// that accepts `{ "text": ... }` payloads.
pub(crate) struct AlertNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl AlertNotifier {
    pub(crate) fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub(crate) async fn notify(&self, alert: &RefreshAlert) -> Result<Delivery, NotifyError> {
        warn!(
            week = %alert.week_start,
            compliance_pct = alert.compliance_pct,
            threshold_pct = alert.threshold_pct,
            "{}",
            alert.message
        );

        let Some(url) = self.webhook_url.as_deref() else {
            return Ok(Delivery::Logged);
        };

        let response = self
            .client
            .post(url)
            .json(&json!({ "text": alert.message, "alert": alert }))
            .send()
            .await
            .map_err(NotifyError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        info!(%status, "refresh alert delivered to webhook");
        Ok(Delivery::Webhook)
    }
}
