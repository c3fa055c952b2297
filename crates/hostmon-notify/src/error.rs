/// Errors surfaced by the notification subsystem.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or invalid.
    #[error("notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP request to the webhook endpoint failed.
    #[error("notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status.
    #[error("notify: endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint accepted the request but rejected the message in its
    /// response envelope.
    #[error("notify: endpoint rejected message (errcode {code}): {message}")]
    Rejected { code: i64, message: String },
}
