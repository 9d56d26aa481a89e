//! Stripe Webhook Reconciliation
//!
//! Verifies inbound event signatures against the exact raw request body,
//! dedups redelivered event ids, and dispatches recognized events. A
//! completed subscription checkout triggers a best-effort thank-you email.
//! Nothing downstream of signature verification changes the acknowledgement:
//! a failed side effect is logged, never surfaced as a non-2xx.

use std::sync::Arc;

use stripe::{
    CheckoutSession, CheckoutSessionMode, Event, EventObject, EventType, Expandable, Subscription,
    SubscriptionId, Webhook, WebhookError,
};
use trumpeter_notify::{Mailer, OutboundEmail};

use crate::client::StripeClient;
use crate::error::{PaymentError, Result};
use crate::store::ProcessedEventStore;

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed. Subscription-mode checkouts carry the data the
    /// thank-you notification needs.
    CheckoutCompleted {
        session_id: String,
        subscription_id: Option<String>,
        customer_email: Option<String>,
        customer_name: Option<String>,
        subscription_mode: bool,
    },

    /// Subscription lifecycle began
    SubscriptionCreated { subscription_id: String },

    /// Subscription ended
    SubscriptionCancelled { subscription_id: String },

    /// Invoice settled
    InvoicePaid { invoice_id: String },

    /// One-off payment settled
    PaymentSucceeded { payment_intent_id: String },

    /// Recognized delivery of an event type we do not act on
    Other { event_type: String },
}

/// What the reconciler did with a verified event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// First delivery, dispatched
    Processed,

    /// Event id already recorded, nothing dispatched
    Duplicate,
}

/// Amount and product details for the thank-you note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub product_name: String,
    pub amount: Option<i64>,
    pub currency: String,
}

/// Webhook pipeline: verification, dedup, dispatch.
pub struct WebhookProcessor<S: ProcessedEventStore> {
    store: Arc<S>,
    mailer: Arc<dyn Mailer>,
}

impl<S: ProcessedEventStore> WebhookProcessor<S> {
    pub fn new(store: Arc<S>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Verify the signature header against the raw body and parse the event.
    ///
    /// The signature check runs over the exact bytes received, before any
    /// parsing. A verified body that still fails to parse is reported
    /// separately so logs can tell tampering from drift.
    pub fn verify_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret).map_err(|e| match e {
            WebhookError::BadParse(parse) => PaymentError::WebhookParse(parse.to_string()),
            other => PaymentError::InvalidSignature(other.to_string()),
        })
    }

    /// Process a verified event exactly once per event id.
    pub async fn process(&self, stripe: &StripeClient, event: &Event) -> Result<Reconciled> {
        let event_id = event.id.to_string();
        let parsed = parse_webhook_event(event);
        self.process_parsed(stripe, &event_id, parsed).await
    }

    /// Record-then-dispatch. The id is recorded before any side effect, so
    /// a concurrent redelivery of the same id dispatches at most once.
    pub(crate) async fn process_parsed(
        &self,
        stripe: &StripeClient,
        event_id: &str,
        event: WebhookEvent,
    ) -> Result<Reconciled> {
        if !self.store.record(event_id)? {
            tracing::info!(event_id = %event_id, "Duplicate webhook delivery, skipping");
            return Ok(Reconciled::Duplicate);
        }

        self.dispatch(stripe, &event).await;
        Ok(Reconciled::Processed)
    }

    /// Dispatch a parsed event. Side-effect failures are logged and
    /// swallowed; the provider must still see a 2xx.
    async fn dispatch(&self, stripe: &StripeClient, event: &WebhookEvent) {
        match event {
            WebhookEvent::CheckoutCompleted {
                session_id,
                subscription_id,
                customer_email,
                customer_name,
                subscription_mode,
            } => {
                tracing::info!(session_id = %session_id, "Payment successful for session");

                if !subscription_mode {
                    return;
                }

                let (Some(email), Some(subscription_id)) = (customer_email, subscription_id)
                else {
                    tracing::debug!(
                        session_id = %session_id,
                        "Completed subscription checkout without email or subscription id"
                    );
                    return;
                };

                match self.subscription_summary(stripe, subscription_id).await {
                    Ok(summary) => {
                        self.send_thank_you(email, customer_name.as_deref(), &summary)
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            subscription_id = %subscription_id,
                            "Could not resolve subscription for notification"
                        );
                    }
                }
            }
            WebhookEvent::SubscriptionCreated { subscription_id } => {
                tracing::info!(subscription_id = %subscription_id, "Subscription created");
            }
            WebhookEvent::SubscriptionCancelled { subscription_id } => {
                tracing::info!(subscription_id = %subscription_id, "Subscription cancelled");
            }
            WebhookEvent::InvoicePaid { invoice_id } => {
                tracing::info!(invoice_id = %invoice_id, "Invoice paid");
            }
            WebhookEvent::PaymentSucceeded { payment_intent_id } => {
                tracing::info!(payment_intent_id = %payment_intent_id, "Payment intent succeeded");
            }
            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled event type");
            }
        }
    }

    /// Resolve the subscription's first line item with its product expanded.
    /// Single attempt: on failure the notification is skipped, and the next
    /// billing cycle gets another chance.
    async fn subscription_summary(
        &self,
        stripe: &StripeClient,
        subscription_id: &str,
    ) -> Result<SubscriptionSummary> {
        let id: SubscriptionId = subscription_id.parse().map_err(|_| {
            PaymentError::WebhookParse(format!("Invalid subscription id: {subscription_id}"))
        })?;

        let subscription =
            Subscription::retrieve(stripe.inner(), &id, &["items.data.price.product"])
                .await
                .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        Ok(summarize_subscription(&subscription))
    }

    /// Best effort. A failed send is logged and swallowed.
    async fn send_thank_you(&self, email: &str, name: Option<&str>, summary: &SubscriptionSummary) {
        let outbound = thank_you_email(email, name, summary);
        match self.mailer.send(&outbound).await {
            Ok(()) => tracing::info!(to = %email, "Subscription confirmation sent"),
            Err(e) => {
                tracing::warn!(error = %e, to = %email, "Subscription confirmation failed");
            }
        }
    }
}

/// Map a provider event into our event type.
fn parse_webhook_event(event: &Event) -> WebhookEvent {
    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = &event.data.object {
                WebhookEvent::CheckoutCompleted {
                    session_id: session.id.to_string(),
                    subscription_id: session
                        .subscription
                        .as_ref()
                        .map(|subscription| subscription.id().to_string()),
                    customer_email: checkout_customer_email(session),
                    customer_name: session
                        .customer_details
                        .as_ref()
                        .and_then(|details| details.name.clone()),
                    subscription_mode: session.mode == CheckoutSessionMode::Subscription,
                }
            } else {
                other_event(event)
            }
        }
        EventType::CustomerSubscriptionCreated => {
            if let EventObject::Subscription(subscription) = &event.data.object {
                WebhookEvent::SubscriptionCreated {
                    subscription_id: subscription.id.to_string(),
                }
            } else {
                other_event(event)
            }
        }
        EventType::CustomerSubscriptionDeleted => {
            if let EventObject::Subscription(subscription) = &event.data.object {
                WebhookEvent::SubscriptionCancelled {
                    subscription_id: subscription.id.to_string(),
                }
            } else {
                other_event(event)
            }
        }
        EventType::InvoicePaid => {
            if let EventObject::Invoice(invoice) = &event.data.object {
                WebhookEvent::InvoicePaid {
                    invoice_id: invoice.id.to_string(),
                }
            } else {
                other_event(event)
            }
        }
        EventType::PaymentIntentSucceeded => {
            if let EventObject::PaymentIntent(intent) = &event.data.object {
                WebhookEvent::PaymentSucceeded {
                    payment_intent_id: intent.id.to_string(),
                }
            } else {
                other_event(event)
            }
        }
        _ => other_event(event),
    }
}

fn other_event(event: &Event) -> WebhookEvent {
    WebhookEvent::Other {
        event_type: event.type_.to_string(),
    }
}

/// Email from customer details, falling back to the legacy top-level field.
fn checkout_customer_email(session: &CheckoutSession) -> Option<String> {
    session
        .customer_details
        .as_ref()
        .and_then(|details| details.email.clone())
        .or_else(|| session.customer_email.clone())
}

/// Pull the first item's price and product name out of a resolved
/// subscription.
fn summarize_subscription(subscription: &Subscription) -> SubscriptionSummary {
    let price = subscription
        .items
        .data
        .first()
        .and_then(|item| item.price.as_ref());

    let product_name = price
        .and_then(|price| price.product.as_ref())
        .and_then(|product| match product {
            Expandable::Object(product) => product.name.clone(),
            Expandable::Id(_) => None,
        })
        .unwrap_or_else(|| "Monthly support".to_string());

    SubscriptionSummary {
        product_name,
        amount: price.and_then(|price| price.unit_amount),
        currency: price
            .and_then(|price| price.currency)
            .map(|c| c.to_string())
            .unwrap_or_default(),
    }
}

/// Compose the post-checkout thank-you note.
fn thank_you_email(email: &str, name: Option<&str>, summary: &SubscriptionSummary) -> OutboundEmail {
    let greeting = name.unwrap_or("friend");
    let amount = summary.amount.map_or_else(
        || "your subscription".to_string(),
        |cents| {
            format!(
                "{}.{:02} {}",
                cents / 100,
                cents % 100,
                summary.currency.to_uppercase()
            )
        },
    );

    OutboundEmail {
        to: email.to_string(),
        subject: "Thank you for supporting the Alert Bay Trumpeter".to_string(),
        text: format!(
            "Hi {greeting},\n\nThank you for subscribing to {} at {amount} per month. \
             Your support keeps the music playing in Alert Bay.\n\n- Jerry",
            summary.product_name
        ),
    }
}
