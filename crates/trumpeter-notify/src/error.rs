//! Notification Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Notification-related errors
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Delivery API rejected the message
    #[error("Mail delivery failed: {0}")]
    Delivery(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// Contact submission failed validation
    #[error("{0}")]
    InvalidContact(String),
}

impl NotifyError {
    /// Whether the caller supplied bad input (as opposed to a delivery fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, NotifyError::InvalidContact(_))
    }
}
