use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound webhook adapter (Zapier). Delivery is a single POST with a short
/// timeout; there is no queueing or retry.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .expect("failed to build http client");

        Self {
            client,
            webhook_url: config.zapier_webhook.clone(),
        }
    }

    /// Best-effort notification for a freshly created ticket. Failures are
    /// logged and never surface to the caller.
    pub async fn ticket_created(&self, ticket: &Value) {
        let Some(url) = &self.webhook_url else {
            return;
        };
        let payload = serde_json::json!({ "ticket": ticket });
        match self.client.post(url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("ticket webhook answered {}", response.status());
            }
            Ok(_) => info!("ticket webhook delivered"),
            Err(e) => warn!("ticket webhook failed: {}", e),
        }
    }

    /// Posts an escalation to the webhook. Unlike ticket notification this is
    /// load-bearing: an unconfigured webhook or a failed delivery is an error.
    pub async fn escalate(&self, payload: &Value) -> AppResult<()> {
        let url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| AppError::MissingConfig("ZAPIER_WEBHOOK".to_string()))?;

        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(AppError::WebhookFailed(format!(
                "escalation webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}
