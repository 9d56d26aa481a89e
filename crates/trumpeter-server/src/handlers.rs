//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use trumpeter_notify::ContactMessage;
use trumpeter_payments::{
    CheckoutPlan, CheckoutRequest, OneTimeProduct, PaymentError, StripeClient, SubscriptionProduct,
};

use crate::state::{AppState, CANONICAL_ORIGIN, SiteConfig};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Error payload returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Redirect payload for checkout and portal routes
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

/// Billing portal request
#[derive(Debug, Deserialize)]
pub struct PortalRequest {
    pub session_id: String,
}

/// Direct price checkout request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductCheckoutRequest {
    #[serde(rename = "priceId")]
    pub price_id: Option<String>,
}

/// Catalog listing payload
#[derive(Debug, Serialize)]
pub struct ProductsResponse<T> {
    pub products: Vec<T>,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct ReceivedResponse {
    pub received: bool,
}

/// Contact form acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub mailer_live: bool,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Checkout
// ============================================================================

/// POST /api/create-checkout-session
///
/// Classifies the payload into one of the three checkout shapes and returns
/// the hosted checkout URL.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<UrlResponse>, HandlerError> {
    let stripe = require_stripe(&state)?;

    let plan = CheckoutPlan::classify(&payload).map_err(|e| {
        tracing::warn!(error = %e, "Rejected checkout request");
        error_response(&e)
    })?;

    let origin = resolve_origin(&state.site, &headers);
    let session = stripe
        .create_checkout_session(&plan, &origin)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Checkout session creation failed");
            error_response(&e)
        })?;

    Ok(Json(UrlResponse { url: session.url }))
}

/// POST /api/create-product-checkout
///
/// One-time, card-only checkout for an existing catalog price id.
pub async fn create_product_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ProductCheckoutRequest>,
) -> Result<Json<UrlResponse>, HandlerError> {
    let stripe = require_stripe(&state)?;
    let price_id = payload.price_id.unwrap_or_default();

    let origin = resolve_origin(&state.site, &headers);
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        tracing::error!(origin = %origin, "Cannot build absolute return URLs");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Unable to construct return URLs".to_string(),
            }),
        ));
    }

    let session = stripe
        .create_price_checkout(&price_id, &origin)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Product checkout creation failed");
            error_response(&e)
        })?;

    Ok(Json(UrlResponse { url: session.url }))
}

// ============================================================================
// Billing Portal
// ============================================================================

/// POST /api/create-portal-session
///
/// Resolves the customer behind a completed checkout session and returns a
/// billing portal URL for them.
pub async fn create_portal_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PortalRequest>,
) -> Result<Json<UrlResponse>, HandlerError> {
    let stripe = require_stripe(&state)?;

    let origin = resolve_origin(&state.site, &headers);
    let url = stripe
        .create_portal_session(&payload.session_id, &origin)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Portal session creation failed");
            error_response(&e)
        })?;

    Ok(Json(UrlResponse { url }))
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse<OneTimeProduct>>, HandlerError> {
    let stripe = require_stripe(&state)?;

    let products = stripe.list_one_time_products().await.map_err(|e| {
        tracing::error!(error = %e, "Product catalog fetch failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to fetch products".to_string(),
            }),
        )
    })?;

    Ok(Json(ProductsResponse { products }))
}

/// GET /api/subscription-products
pub async fn list_subscription_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse<SubscriptionProduct>>, HandlerError> {
    let stripe = require_stripe(&state)?;

    let products = stripe.list_subscription_products().await.map_err(|e| {
        tracing::error!(error = %e, "Subscription catalog fetch failed");
        error_response(&e)
    })?;

    Ok(Json(ProductsResponse { products }))
}

// ============================================================================
// Webhook
// ============================================================================

/// POST /api/webhook
///
/// Verifies the signature over the raw body, then acknowledges with a 2xx
/// regardless of what dispatch does. Only verification failures produce a
/// 400, which tells the provider to retry.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ReceivedResponse>, HandlerError> {
    let stripe = require_stripe(&state)?;

    let Some(signature) = header_str(&headers, "stripe-signature") else {
        tracing::warn!("Webhook request missing signature header");
        return Err(invalid_signature());
    };

    let event = state
        .webhook
        .verify_event(&body, signature, stripe.webhook_secret())
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook verification failed");
            invalid_signature()
        })?;

    if let Err(e) = state.webhook.process(stripe, &event).await {
        tracing::error!(error = %e, event_id = %event.id, "Webhook processing failed");
    }

    Ok(Json(ReceivedResponse { received: true }))
}

// ============================================================================
// Contact
// ============================================================================

/// POST /api/send-email
///
/// Validates the contact form and records it in the logs. No mail leaves
/// the process here.
pub async fn send_email(
    State(state): State<AppState>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<MessageResponse>, HandlerError> {
    message.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    tracing::info!(
        name = %message.name,
        email = %message.email,
        subject = %message.subject,
        preview = %message.preview(),
        to = %state.site.contact_email,
        "Contact form submission received"
    );

    Ok(Json(MessageResponse {
        message: "Email sent successfully".to_string(),
    }))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        mailer_live: state.mailer.is_live(),
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn require_stripe(state: &AppState) -> Result<&StripeClient, HandlerError> {
    match &state.stripe {
        Some(stripe) => Ok(stripe.as_ref()),
        None => {
            let error = state
                .stripe_error
                .clone()
                .unwrap_or_else(|| "Stripe is not configured".to_string());
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })))
        }
    }
}

fn error_response(err: &PaymentError) -> HandlerError {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn invalid_signature() -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid signature".to_string(),
        }),
    )
}

/// Effective request origin for redirect URLs: the configured base URL, then
/// the `Origin` header, then scheme and host from forwarded headers, then
/// the canonical site. Trailing slashes are trimmed.
fn resolve_origin(site: &SiteConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &site.site_url {
        return url.trim_end_matches('/').to_string();
    }

    if let Some(origin) = header_str(headers, "origin") {
        return origin.trim_end_matches('/').to_string();
    }

    if let Some(host) = header_str(headers, "host") {
        let proto = header_str(headers, "x-forwarded-proto").unwrap_or("https");
        return format!("{proto}://{host}");
    }

    CANONICAL_ORIGIN.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
