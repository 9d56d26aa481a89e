//! Stripe Configuration
//!
//! Validated once at startup. Handlers receive a constructed client and
//! never read the environment themselves; a bad key fails fast here with
//! the same message the payment routes later surface.

use stripe::Currency;

use crate::error::{PaymentError, Result};

/// Key shipped in the starter `.env.example`.
const PLACEHOLDER_KEY: &str = "sk_test_your_secret_key_here";

/// Fragment that marks any half-edited placeholder key.
const PLACEHOLDER_FRAGMENT: &str = "your_secret_key_here";

/// Validated Stripe configuration
#[derive(Clone, Debug)]
pub struct StripeConfig {
    /// Secret API key, trimmed and prefix-checked
    pub secret_key: String,

    /// Webhook signing secret
    pub webhook_secret: String,

    /// Currency applied when a checkout request does not name one
    pub default_currency: Currency,
}

impl StripeConfig {
    /// Build a validated configuration from raw values.
    pub fn new(secret_key: &str, webhook_secret: &str) -> Result<Self> {
        Ok(Self {
            secret_key: Self::validate_secret_key(secret_key)?,
            webhook_secret: webhook_secret.to_string(),
            default_currency: Currency::CAD,
        })
    }

    /// Read configuration from `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`
    /// and optionally `DEFAULT_CURRENCY`.
    pub fn from_env() -> Result<Self> {
        let raw_key = std::env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        let secret_key = Self::validate_secret_key(&raw_key)?;

        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            PaymentError::ConfigMissing(
                "STRIPE_WEBHOOK_SECRET environment variable is not set".into(),
            )
        })?;

        let default_currency = match std::env::var("DEFAULT_CURRENCY") {
            Ok(raw) => raw.to_lowercase().parse::<Currency>().map_err(|_| {
                PaymentError::ConfigMalformed(format!("Unrecognized DEFAULT_CURRENCY: {raw}"))
            })?,
            Err(_) => Currency::CAD,
        };

        Ok(Self {
            secret_key,
            webhook_secret,
            default_currency,
        })
    }

    /// Validate a raw secret key: present, not the placeholder, recognized
    /// prefix. Returns the trimmed key.
    pub fn validate_secret_key(raw: &str) -> Result<String> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(PaymentError::ConfigMissing(
                "STRIPE_SECRET_KEY environment variable is not set".into(),
            ));
        }

        if trimmed == PLACEHOLDER_KEY || trimmed.contains(PLACEHOLDER_FRAGMENT) {
            return Err(PaymentError::ConfigPlaceholder(
                "Please replace the placeholder STRIPE_SECRET_KEY with your actual Stripe secret key from your Stripe dashboard".into(),
            ));
        }

        if !trimmed.starts_with("sk_test_") && !trimmed.starts_with("sk_live_") {
            return Err(PaymentError::ConfigMalformed(
                "Invalid Stripe key format. Must start with sk_test_ or sk_live_".into(),
            ));
        }

        Ok(trimmed.to_string())
    }

    /// Whether the key points at Stripe's test mode.
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_rejected() {
        let err = StripeConfig::validate_secret_key("").unwrap_err();
        assert!(matches!(err, PaymentError::ConfigMissing(_)));
        assert_eq!(
            err.to_string(),
            "STRIPE_SECRET_KEY environment variable is not set"
        );

        let err = StripeConfig::validate_secret_key("   ").unwrap_err();
        assert!(matches!(err, PaymentError::ConfigMissing(_)));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let err = StripeConfig::validate_secret_key("sk_test_your_secret_key_here").unwrap_err();
        assert!(matches!(err, PaymentError::ConfigPlaceholder(_)));

        // A placeholder pasted into an otherwise plausible key still counts.
        let err =
            StripeConfig::validate_secret_key("sk_live_your_secret_key_here_123").unwrap_err();
        assert!(matches!(err, PaymentError::ConfigPlaceholder(_)));
    }

    #[test]
    fn test_unrecognized_prefix_rejected() {
        for key in ["pk_test_abc123", "whsec_abc123", "not-a-key"] {
            let err = StripeConfig::validate_secret_key(key).unwrap_err();
            assert!(matches!(err, PaymentError::ConfigMalformed(_)), "{key}");
            assert_eq!(
                err.to_string(),
                "Invalid Stripe key format. Must start with sk_test_ or sk_live_"
            );
        }
    }

    #[test]
    fn test_valid_key_trimmed() {
        let key = StripeConfig::validate_secret_key("  sk_test_abc123\n").unwrap();
        assert_eq!(key, "sk_test_abc123");

        let key = StripeConfig::validate_secret_key("sk_live_abc123").unwrap();
        assert_eq!(key, "sk_live_abc123");
    }

    #[test]
    fn test_defaults() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_test").unwrap();
        assert_eq!(config.default_currency, Currency::CAD);
        assert!(config.is_test_mode());

        let config = StripeConfig::new("sk_live_abc123", "whsec_test").unwrap();
        assert!(!config.is_test_mode());
    }
}
