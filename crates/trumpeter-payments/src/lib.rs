//! # trumpeter-payments
//!
//! Stripe payment orchestration for the Alert Bay Trumpeter site: checkout
//! session creation for sponsor tiers and subscriptions, billing portal
//! access, live catalog projection, and webhook reconciliation with
//! signature verification and event dedup.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trumpeter_notify::LogMailer;
//! use trumpeter_payments::{
//!     CheckoutPlan, CheckoutRequest, MemoryEventStore, StripeClient, WebhookProcessor,
//! };
//!
//! let stripe = StripeClient::from_env()?;
//!
//! // Classify a request payload and send the supporter to checkout.
//! let request: CheckoutRequest = serde_json::from_str(r#"{"lookup_key":"gold"}"#)?;
//! let plan = CheckoutPlan::classify(&request)?;
//! let session = stripe
//!     .create_checkout_session(&plan, "https://alertbaytrumpeter.com")
//!     .await?;
//! println!("redirect to {}", session.url);
//!
//! // Reconcile webhook deliveries exactly once per event id.
//! let processor = WebhookProcessor::new(Arc::new(MemoryEventStore::new()), Arc::new(LogMailer));
//! let event = processor.verify_event(&body, &signature_header, stripe.webhook_secret())?;
//! processor.process(&stripe, &event).await?;
//! ```

mod catalog;
mod checkout;
mod client;
mod config;
mod error;
mod portal;
mod store;
mod tiers;
mod webhook;

pub use catalog::{OneTimeProduct, PriceSummary, SubscriptionProduct};
pub use checkout::{CheckoutPlan, CheckoutRequest, CreatedSession};
pub use client::{RetryConfig, StripeClient};
pub use config::StripeConfig;
pub use error::{PaymentError, Result};
pub use store::{DEFAULT_RETENTION_HOURS, MemoryEventStore, ProcessedEventStore};
pub use tiers::SponsorTier;
pub use webhook::{Reconciled, SubscriptionSummary, WebhookEvent, WebhookProcessor};
