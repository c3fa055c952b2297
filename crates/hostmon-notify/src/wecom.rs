use crate::error::NotifyError;
use crate::Notifier;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;

/// WeCom (WeChat Work) robot webhook channel.
///
/// Sends plain-text messages to the robot webhook URL. Delivery is
/// attempted up to three times with exponential backoff; the request
/// timeout bounds every attempt.
pub struct WeComChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl WeComChannel {
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self, NotifyError> {
        if webhook_url.is_empty() {
            return Err(NotifyError::InvalidConfig("webhook_url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Http)?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }

    async fn attempt(&self, payload: &Value) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // WeCom answers 200 even on rejection; the verdict is in the
        // errcode envelope.
        let body: Value = resp.json().await?;
        let errcode = body.get("errcode").and_then(|v| v.as_i64()).unwrap_or(-1);
        if errcode == 0 {
            return Ok(());
        }
        let errmsg = body
            .get("errmsg")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        Err(NotifyError::Rejected {
            code: errcode,
            message: errmsg,
        })
    }
}

#[async_trait]
impl Notifier for WeComChannel {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "msgtype": "text",
            "text": { "content": text },
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&payload).await {
                Ok(()) => {
                    tracing::debug!(attempt, "notification delivered");
                    return Ok(());
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "notification send failed, retrying");
                    tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt - 1))).await;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "notification send failed, giving up");
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "wecom"
    }
}
