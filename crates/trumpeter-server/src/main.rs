//! Alert Bay Trumpeter API Server
//!
//! Axum server exposing the donation and subscription API for Jerry
//! Higginson's site: checkout session creation, billing portal access,
//! catalog listing, contact form intake and Stripe webhook reconciliation.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trumpeter_notify::{LogMailer, Mailer, ResendConfig, ResendMailer};
use trumpeter_payments::{MemoryEventStore, StripeClient, WebhookProcessor};

use crate::handlers::{
    create_checkout_session, create_portal_session, create_product_checkout, health_check,
    list_products, list_subscription_products, send_email, stripe_webhook,
};
use crate::state::{AppState, SiteConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let site = Arc::new(SiteConfig::from_env());

    // Stripe is optional at boot; payment routes surface the stored error
    // until the key is fixed.
    let (stripe, stripe_error) = match StripeClient::from_env() {
        Ok(client) => {
            let mode = if client.config().is_test_mode() {
                "test"
            } else {
                "live"
            };
            tracing::info!(mode, "✓ Stripe configured");
            (Some(Arc::new(client)), None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "⚠ Stripe not configured - payment routes will fail");
            tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
            (None, Some(e.to_string()))
        }
    };

    let mailer: Arc<dyn Mailer> = match std::env::var("RESEND_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            tracing::info!("✓ Resend mailer configured");
            Arc::new(ResendMailer::new(ResendConfig::new(key.trim()))?)
        }
        _ => {
            tracing::warn!("⚠ RESEND_API_KEY not set - emails are logged, not delivered");
            Arc::new(LogMailer)
        }
    };

    let events = Arc::new(MemoryEventStore::new());
    let webhook = Arc::new(WebhookProcessor::new(events, mailer.clone()));

    let state = AppState {
        stripe,
        stripe_error,
        webhook,
        mailer,
        site,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/create-portal-session", post(create_portal_session))
        .route("/api/create-product-checkout", post(create_product_checkout))
        .route("/api/products", get(list_products))
        .route("/api/subscription-products", get(list_subscription_products))
        .route("/api/webhook", post(stripe_webhook))
        .route("/api/send-email", post(send_email))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🎺 Alert Bay Trumpeter API running on http://{}", addr);
    tracing::info!("   POST /api/create-checkout-session - sponsor tiers & subscriptions");
    tracing::info!("   POST /api/create-portal-session   - billing portal");
    tracing::info!("   POST /api/create-product-checkout - direct price checkout");
    tracing::info!("   GET  /api/products                - one-time catalog");
    tracing::info!("   GET  /api/subscription-products   - subscription catalog");
    tracing::info!("   POST /api/webhook                 - Stripe events");
    tracing::info!("   POST /api/send-email              - contact form");

    axum::serve(listener, app).await?;

    Ok(())
}
