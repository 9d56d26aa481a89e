//! Application State

use std::sync::Arc;

use trumpeter_notify::{DEFAULT_CONTACT_EMAIL, Mailer};
use trumpeter_payments::{MemoryEventStore, StripeClient, WebhookProcessor};

/// Origin used when nothing is configured and the request carries no usable
/// headers.
pub const CANONICAL_ORIGIN: &str = "https://alertbaytrumpeter.com";

/// Site-level configuration
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Public base URL overriding request-derived origins, when set
    pub site_url: Option<String>,

    /// Inbox the contact form targets
    pub contact_email: String,
}

impl SiteConfig {
    /// Read site configuration from `SITE_URL` and `CONTACT_EMAIL`.
    pub fn from_env() -> Self {
        Self {
            site_url: std::env::var("SITE_URL").ok().filter(|url| !url.is_empty()),
            contact_email: std::env::var("CONTACT_EMAIL")
                .ok()
                .filter(|email| !email.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTACT_EMAIL.to_string()),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: None,
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe client, absent when startup configuration failed
    pub stripe: Option<Arc<StripeClient>>,

    /// Why the client is absent, surfaced verbatim on payment routes
    pub stripe_error: Option<String>,

    /// Webhook verification and dispatch pipeline
    pub webhook: Arc<WebhookProcessor<MemoryEventStore>>,

    /// Outbound mail transport
    pub mailer: Arc<dyn Mailer>,

    /// Site-level configuration
    pub site: Arc<SiteConfig>,
}
