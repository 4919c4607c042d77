use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{EmailMessage, NotifyError, Notifier, PushMessage};

/// JSON-over-HTTP delivery to the email and push SaaS endpoints.
pub struct HttpNotifier {
    client: Client,
    email_endpoint: Option<String>,
    push_endpoint: Option<String>,
    api_key: Option<String>,
    from_address: String,
}

impl HttpNotifier {
    pub fn from_config(cfg: &configs::NotifyConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            email_endpoint: cfg.email_endpoint.clone(),
            push_endpoint: cfg.push_endpoint.clone(),
            api_key: cfg.api_key.clone(),
            from_address: cfg.from_address.clone().unwrap_or_else(|| "no-reply@capital-m.local".into()),
        })
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<(), NotifyError> {
        let mut req = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(format!("status {}", resp.status())));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_email(&self, msg: &EmailMessage) -> Result<(), NotifyError> {
        let Some(url) = &self.email_endpoint else {
            tracing::info!(to = %msg.to, subject = %msg.subject, "email endpoint not configured; skipped");
            return Ok(());
        };
        self.post(url, json!({
            "from": self.from_address,
            "to": msg.to,
            "subject": msg.subject,
            "text": msg.body,
        }))
        .await
    }

    async fn send_push(&self, msg: &PushMessage) -> Result<(), NotifyError> {
        let Some(url) = &self.push_endpoint else {
            tracing::info!(user_id = %msg.user_id, title = %msg.title, "push endpoint not configured; skipped");
            return Ok(());
        };
        self.post(url, json!({
            "external_user_id": msg.user_id,
            "title": msg.title,
            "body": msg.body,
            "data": msg.data,
        }))
        .await
    }
}
