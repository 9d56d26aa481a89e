//! Outbound Mail Delivery
//!
//! [`Mailer`] abstracts the delivery service so the webhook reconciler and
//! the contact handler never couple to a vendor API. `ResendMailer` posts
//! through the Resend HTTP API; `LogMailer` records the send and succeeds,
//! which is the behavior when no API key is configured.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{NotifyError, Result};

/// An email ready for delivery.
#[derive(Clone, Debug, Serialize)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub text: String,
}

/// Mail delivery abstraction.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, email: &OutboundEmail) -> Result<()>;

    /// Whether sends actually leave the process (false for the log fallback).
    fn is_live(&self) -> bool {
        true
    }
}

/// Resend API configuration
#[derive(Clone, Debug)]
pub struct ResendConfig {
    /// API key (`re_...`)
    pub api_key: String,

    /// Sender identity
    pub from: String,

    /// API endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: "Alert Bay Trumpeter <no-reply@alertbaytrumpeter.com>".into(),
            endpoint: "https://api.resend.com/emails".into(),
            timeout_secs: 10,
        }
    }
}

/// Mailer backed by the Resend HTTP API
pub struct ResendMailer {
    config: ResendConfig,
    client: reqwest::Client,
}

impl ResendMailer {
    /// Build a mailer with a bounded request timeout.
    pub fn new(config: ResendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let payload = serde_json::json!({
            "from": self.config.from,
            "to": [email.to],
            "subject": email.subject,
            "text": email.text,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!("{status}: {body}")));
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Email delivered");
        Ok(())
    }
}

/// Fallback mailer that logs the message and succeeds.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email would be sent");
        tracing::debug!(body = %email.text, "Email body");
        Ok(())
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        let email = OutboundEmail {
            to: "fan@example.com".into(),
            subject: "Thank you".into(),
            text: "Your support keeps the music going.".into(),
        };

        assert!(mailer.send(&email).await.is_ok());
        assert!(!mailer.is_live());
    }

    #[test]
    fn test_resend_mailer_is_live() {
        let mailer = ResendMailer::new(ResendConfig::new("re_test_key")).unwrap();
        assert!(mailer.is_live());
    }

    #[test]
    fn test_resend_config_defaults() {
        let config = ResendConfig::new("re_123");
        assert_eq!(config.endpoint, "https://api.resend.com/emails");
        assert_eq!(config.timeout_secs, 10);
    }
}
