//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
///
/// Display strings double as the wire `{error}` messages, so config and
/// client-input variants carry the exact text the site's callers expect.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Required configuration is absent
    #[error("{0}")]
    ConfigMissing(String),

    /// Configuration still holds a starter placeholder value
    #[error("{0}")]
    ConfigPlaceholder(String),

    /// Configuration present but not in a recognized format
    #[error("{0}")]
    ConfigMalformed(String),

    /// Caller payload failed validation
    #[error("{0}")]
    ClientInput(String),

    /// Stripe API failure, message passed through
    #[error("{0}")]
    Stripe(String),

    /// Webhook signature verification failed
    #[error("Invalid signature")]
    InvalidSignature(String),

    /// Webhook body verified but did not parse as an event
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Checkout session has no customer attached
    #[error("No customer found")]
    NoCustomer,

    /// Provider response omitted an expected redirect URL
    #[error("{0}")]
    MissingUrl(String),
}

impl PaymentError {
    /// Whether the caller is at fault (HTTP 400) rather than this service
    /// or the provider (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentError::ClientInput(_)
                | PaymentError::InvalidSignature(_)
                | PaymentError::WebhookParse(_)
                | PaymentError::NoCustomer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert!(PaymentError::ClientInput("Invalid sponsor tier".into()).is_client_error());
        assert!(PaymentError::NoCustomer.is_client_error());
        assert!(PaymentError::InvalidSignature("bad".into()).is_client_error());

        assert!(!PaymentError::Stripe("rate limited".into()).is_client_error());
        assert!(!PaymentError::ConfigMissing("key".into()).is_client_error());
    }

    #[test]
    fn test_display_matches_wire_messages() {
        assert_eq!(PaymentError::NoCustomer.to_string(), "No customer found");
        assert_eq!(
            PaymentError::InvalidSignature("detail stays out of the body".into()).to_string(),
            "Invalid signature"
        );
        assert_eq!(
            PaymentError::Stripe("No such price: price_123".into()).to_string(),
            "No such price: price_123"
        );
    }
}
