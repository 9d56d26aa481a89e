//! Billing Portal Sessions
//!
//! Turns a completed checkout session id into a customer-scoped billing
//! portal URL. The session retrieval is an idempotent read and goes through
//! the retry policy; the portal creation does not.

use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionId, CreateBillingPortalSession,
    CustomerId,
};

use crate::client::StripeClient;
use crate::error::{PaymentError, Result};

impl StripeClient {
    /// Create a billing-portal session for the customer behind a checkout
    /// session. Returns the portal URL.
    pub async fn create_portal_session(
        &self,
        session_id: &str,
        return_url: &str,
    ) -> Result<String> {
        let id: CheckoutSessionId = session_id.parse().map_err(|_| {
            PaymentError::ClientInput(format!("Invalid checkout session id: {session_id}"))
        })?;

        let session = self
            .with_retry("retrieve_checkout_session", || {
                let client = self.inner().clone();
                let id = id.clone();
                async move { CheckoutSession::retrieve(&client, &id, &[]).await }
            })
            .await?;

        let customer = session
            .customer
            .as_ref()
            .map(|customer| customer.id().to_string())
            .ok_or(PaymentError::NoCustomer)?;
        let customer_id = customer
            .parse::<CustomerId>()
            .map_err(|e| PaymentError::Stripe(format!("Invalid customer ID: {e}")))?;

        let mut params = CreateBillingPortalSession::new(customer_id);
        params.return_url = Some(return_url);

        let portal = BillingPortalSession::create(self.inner(), params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::info!(session_id, "Billing portal session created");

        Ok(portal.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripeConfig;

    #[tokio::test]
    async fn test_malformed_session_id_rejected_before_any_call() {
        let client = StripeClient::new(StripeConfig::new("sk_test_abc123", "whsec_test").unwrap());

        let err = client
            .create_portal_session("not-a-session-id", "https://alertbaytrumpeter.com")
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::ClientInput(_)));
    }
}
