//! Notification boundary: message rendering and webhook delivery.
//!
//! The control loop renders outbound messages with [`message`] and hands
//! the finished text to a [`Notifier`]. The built-in channel is the WeCom
//! (WeChat Work) robot webhook; delivery retries and the request timeout
//! are owned here, not by the caller.

pub mod error;
pub mod message;
pub mod wecom;


use async_trait::async_trait;
use error::NotifyError;

/// A delivery channel for finished notification text.
///
/// # Errors
///
/// `send` returns an error only after the channel's own retry budget is
/// exhausted; the caller logs and drops the message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;

    /// Channel name used for logging (e.g. `"wecom"`).
    fn name(&self) -> &str;
}

/// Stand-in channel used when no webhook URL is configured. Messages are
/// dropped after a debug log line; everything else in the agent behaves
/// as if delivery succeeded.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _text: &str) -> Result<(), NotifyError> {
        tracing::debug!("notifications disabled, dropping message");
        Ok(())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
