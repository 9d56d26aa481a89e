//! Checkout Session Creation
//!
//! One endpoint accepts three historical request shapes. Classification is
//! strict and ordered: ad-hoc subscription first, then the buck-a-month
//! shortcut, then sponsor-tier lookup. A payload matching none of them is a
//! client error, never a silent fallback.

use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionLineItemsPriceData, CreateCheckoutSessionLineItemsPriceDataProductData,
    CreateCheckoutSessionLineItemsPriceDataRecurring,
    CreateCheckoutSessionLineItemsPriceDataRecurringInterval,
    CreateCheckoutSessionPaymentMethodTypes, Currency,
};

use crate::client::StripeClient;
use crate::error::{PaymentError, Result};
use crate::tiers::{
    BUCK_A_MONTH_AMOUNT, BUCK_A_MONTH_DESCRIPTION, BUCK_A_MONTH_NAME, SUBSCRIPTION_DESCRIPTION,
    SponsorTier,
};

/// Checkout request payload.
///
/// The optional fields cover the union of all three shapes;
/// [`CheckoutPlan::classify`] picks exactly one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    /// Sponsor-tier identifier for fixed one-time donations
    pub lookup_key: Option<String>,

    /// Legacy shortcut: `buck_a_month` selects the $1/month subscription
    #[serde(rename = "priceId")]
    pub price_id: Option<String>,

    /// Legacy shortcut: `Monthly Supporter` selects the $1/month subscription
    #[serde(rename = "sponsorTier")]
    pub sponsor_tier: Option<String>,

    /// Ad-hoc subscription: product identifier
    #[serde(rename = "productId")]
    pub product_id: Option<String>,

    /// Ad-hoc subscription: product display name
    #[serde(rename = "productName")]
    pub product_name: Option<String>,

    /// Ad-hoc subscription: amount in cents
    pub price: Option<i64>,

    /// Ad-hoc subscription: ISO currency code
    pub currency: Option<String>,

    /// Ad-hoc subscription: line-item description override
    pub description: Option<String>,

    /// `subscription` marks the ad-hoc subscription shape
    pub mode: Option<String>,
}

/// A classified checkout request, ready to become a provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutPlan {
    /// Ad-hoc monthly subscription for a named product
    Subscription {
        product_name: String,
        description: String,
        amount: i64,
        currency: Option<Currency>,
    },

    /// Legacy $1 CAD/month supporter subscription
    BuckAMonth,

    /// Fixed one-time sponsor-tier donation
    Donation(SponsorTier),
}

impl CheckoutPlan {
    /// Classify a payload into exactly one plan.
    ///
    /// An ad-hoc subscription requires `mode: "subscription"` plus a product
    /// id and a positive amount; anything less falls through to the next
    /// shape rather than erroring early.
    pub fn classify(request: &CheckoutRequest) -> Result<Self> {
        if request.mode.as_deref() == Some("subscription") {
            if let (Some(product_id), Some(price)) =
                (request.product_id.as_deref(), request.price)
            {
                if price <= 0 {
                    return Err(PaymentError::ClientInput(
                        "Subscription price must be a positive amount in cents".into(),
                    ));
                }

                let currency = match request.currency.as_deref() {
                    Some(raw) => Some(parse_currency(raw)?),
                    None => None,
                };

                return Ok(CheckoutPlan::Subscription {
                    product_name: request
                        .product_name
                        .clone()
                        .unwrap_or_else(|| product_id.to_string()),
                    description: request
                        .description
                        .clone()
                        .unwrap_or_else(|| SUBSCRIPTION_DESCRIPTION.to_string()),
                    amount: price,
                    currency,
                });
            }
        }

        if request.price_id.as_deref() == Some("buck_a_month")
            || request.sponsor_tier.as_deref() == Some("Monthly Supporter")
        {
            return Ok(CheckoutPlan::BuckAMonth);
        }

        let Some(key) = request.lookup_key.as_deref() else {
            return Err(PaymentError::ClientInput(
                "Missing lookup_key for sponsor tier".into(),
            ));
        };

        let tier = SponsorTier::from_key(key)
            .ok_or_else(|| PaymentError::ClientInput("Invalid sponsor tier".into()))?;

        Ok(CheckoutPlan::Donation(tier))
    }

    /// Checkout mode for this plan.
    pub fn mode(&self) -> CheckoutSessionMode {
        match self {
            CheckoutPlan::Donation(_) => CheckoutSessionMode::Payment,
            CheckoutPlan::Subscription { .. } | CheckoutPlan::BuckAMonth => {
                CheckoutSessionMode::Subscription
            }
        }
    }

    /// The single line item for this plan, resolved against the configured
    /// default currency.
    fn line_item(&self, default_currency: Currency) -> LineItem {
        match self {
            CheckoutPlan::Subscription {
                product_name,
                description,
                amount,
                currency,
            } => LineItem {
                name: product_name.clone(),
                description: description.clone(),
                amount: *amount,
                currency: currency.unwrap_or(default_currency),
                recurring_monthly: true,
            },
            CheckoutPlan::BuckAMonth => LineItem {
                name: BUCK_A_MONTH_NAME.to_string(),
                description: BUCK_A_MONTH_DESCRIPTION.to_string(),
                amount: BUCK_A_MONTH_AMOUNT,
                currency: Currency::CAD,
                recurring_monthly: true,
            },
            CheckoutPlan::Donation(tier) => LineItem {
                name: tier.product_name(),
                description: tier.product_description(),
                amount: tier.amount(),
                currency: default_currency,
                recurring_monthly: false,
            },
        }
    }
}

/// Resolved line-item content
struct LineItem {
    name: String,
    description: String,
    amount: i64,
    currency: Currency,
    recurring_monthly: bool,
}

/// Provider session reference handed back to the caller.
#[derive(Clone, Debug, Serialize)]
pub struct CreatedSession {
    /// Provider session id
    pub id: String,

    /// Hosted checkout URL to redirect the supporter to
    pub url: String,
}

impl StripeClient {
    /// Create a checkout session for a classified plan.
    ///
    /// `origin` is the scheme-and-host base for the success and cancel
    /// redirect URLs.
    pub async fn create_checkout_session(
        &self,
        plan: &CheckoutPlan,
        origin: &str,
    ) -> Result<CreatedSession> {
        let item = plan.line_item(self.config().default_currency);
        let success_url = format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{origin}/cancel");

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(plan.mode());
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: item.currency,
                unit_amount: Some(item.amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: item.name.clone(),
                    description: Some(item.description.clone()),
                    ..Default::default()
                }),
                recurring: item.recurring_monthly.then(|| {
                    CreateCheckoutSessionLineItemsPriceDataRecurring {
                        interval: CreateCheckoutSessionLineItemsPriceDataRecurringInterval::Month,
                        interval_count: Some(1),
                    }
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let client = self.idempotent("create_checkout_session");
        let session = CheckoutSession::create(&client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::info!(
            session_id = %session.id,
            mode = ?plan.mode(),
            amount = item.amount,
            "Checkout session created"
        );

        let url = session
            .url
            .ok_or_else(|| PaymentError::MissingUrl("No checkout URL returned".into()))?;

        Ok(CreatedSession {
            id: session.id.to_string(),
            url,
        })
    }

    /// Create a one-time, card-only checkout for an existing catalog price.
    pub async fn create_price_checkout(
        &self,
        price_id: &str,
        origin: &str,
    ) -> Result<CreatedSession> {
        if price_id.trim().is_empty() {
            return Err(PaymentError::ClientInput("Price ID is required".into()));
        }

        let success_url = format!("{origin}/success?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{origin}/cancel");

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(&success_url);
        params.cancel_url = Some(&cancel_url);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]);

        let client = self.idempotent("create_price_checkout");
        let session = CheckoutSession::create(&client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        tracing::info!(session_id = %session.id, price_id, "Product checkout session created");

        let url = session
            .url
            .ok_or_else(|| PaymentError::MissingUrl("No checkout URL returned".into()))?;

        Ok(CreatedSession {
            id: session.id.to_string(),
            url,
        })
    }
}

/// Parse a caller-supplied currency code. Stripe codes are lowercase, so the
/// input is lowercased first.
fn parse_currency(raw: &str) -> Result<Currency> {
    raw.to_lowercase()
        .parse::<Currency>()
        .map_err(|_| PaymentError::ClientInput(format!("Unrecognized currency: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription_request() -> CheckoutRequest {
        CheckoutRequest {
            product_id: Some("prod_1".into()),
            product_name: Some("Trumpet Maintenance Fund".into()),
            price: Some(500),
            currency: Some("cad".into()),
            mode: Some("subscription".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_subscription_shape_wins_over_all_others() {
        let request = CheckoutRequest {
            lookup_key: Some("gold".into()),
            price_id: Some("buck_a_month".into()),
            sponsor_tier: Some("Monthly Supporter".into()),
            ..subscription_request()
        };

        let plan = CheckoutPlan::classify(&request).unwrap();
        assert!(matches!(plan, CheckoutPlan::Subscription { .. }));
    }

    #[test]
    fn test_subscription_plan_fields() {
        let plan = CheckoutPlan::classify(&subscription_request()).unwrap();
        assert_eq!(plan.mode(), CheckoutSessionMode::Subscription);

        let item = plan.line_item(Currency::CAD);
        assert_eq!(item.name, "Trumpet Maintenance Fund");
        assert_eq!(item.amount, 500);
        assert_eq!(item.currency, Currency::CAD);
        assert!(item.recurring_monthly);
        assert_eq!(item.description, SUBSCRIPTION_DESCRIPTION);
    }

    #[test]
    fn test_incomplete_subscription_falls_through() {
        // Subscription mode without a price is not an error by itself; the
        // payload still matches the tier shape.
        let request = CheckoutRequest {
            mode: Some("subscription".into()),
            product_id: Some("prod_1".into()),
            lookup_key: Some("gold".into()),
            ..Default::default()
        };

        let plan = CheckoutPlan::classify(&request).unwrap();
        assert_eq!(plan, CheckoutPlan::Donation(SponsorTier::Gold));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        for price in [0, -500] {
            let request = CheckoutRequest {
                price: Some(price),
                ..subscription_request()
            };
            let err = CheckoutPlan::classify(&request).unwrap_err();
            assert!(matches!(err, PaymentError::ClientInput(_)), "{price}");
        }
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let request = CheckoutRequest {
            currency: Some("beaver pelts".into()),
            ..subscription_request()
        };
        let err = CheckoutPlan::classify(&request).unwrap_err();
        assert!(matches!(err, PaymentError::ClientInput(_)));
    }

    #[test]
    fn test_uppercase_currency_accepted() {
        let request = CheckoutRequest {
            currency: Some("USD".into()),
            ..subscription_request()
        };
        let plan = CheckoutPlan::classify(&request).unwrap();
        assert_eq!(plan.line_item(Currency::CAD).currency, Currency::USD);
    }

    #[test]
    fn test_buck_a_month_by_price_id() {
        let request = CheckoutRequest {
            price_id: Some("buck_a_month".into()),
            lookup_key: Some("gold".into()),
            ..Default::default()
        };

        let plan = CheckoutPlan::classify(&request).unwrap();
        assert_eq!(plan, CheckoutPlan::BuckAMonth);

        let item = plan.line_item(Currency::USD);
        assert_eq!(item.name, BUCK_A_MONTH_NAME);
        assert_eq!(item.amount, BUCK_A_MONTH_AMOUNT);
        // The buck-a-month tier is pinned to CAD regardless of the default.
        assert_eq!(item.currency, Currency::CAD);
        assert!(item.recurring_monthly);
    }

    #[test]
    fn test_buck_a_month_by_sponsor_tier_label() {
        let request = CheckoutRequest {
            sponsor_tier: Some("Monthly Supporter".into()),
            ..Default::default()
        };
        assert_eq!(
            CheckoutPlan::classify(&request).unwrap(),
            CheckoutPlan::BuckAMonth
        );
    }

    #[test]
    fn test_gold_tier_donation() {
        let request = CheckoutRequest {
            lookup_key: Some("gold".into()),
            ..Default::default()
        };

        let plan = CheckoutPlan::classify(&request).unwrap();
        assert_eq!(plan, CheckoutPlan::Donation(SponsorTier::Gold));
        assert_eq!(plan.mode(), CheckoutSessionMode::Payment);

        let item = plan.line_item(Currency::CAD);
        assert_eq!(item.amount, 10000);
        assert_eq!(item.currency, Currency::CAD);
        assert_eq!(item.name, "Gold Sponsor - Alert Bay Trumpeter");
        assert!(!item.recurring_monthly);
    }

    #[test]
    fn test_empty_payload_rejected() {
        let err = CheckoutPlan::classify(&CheckoutRequest::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing lookup_key for sponsor tier");
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let request = CheckoutRequest {
            lookup_key: Some("platinum".into()),
            ..Default::default()
        };
        let err = CheckoutPlan::classify(&request).unwrap_err();
        assert_eq!(err.to_string(), "Invalid sponsor tier");
    }

    #[test]
    fn test_request_deserializes_wire_field_names() {
        let request: CheckoutRequest = serde_json::from_str(
            r#"{
                "productId": "prod_1",
                "productName": "Harbour Concerts",
                "price": 500,
                "currency": "cad",
                "mode": "subscription"
            }"#,
        )
        .unwrap();

        assert_eq!(request.product_id.as_deref(), Some("prod_1"));
        assert_eq!(request.product_name.as_deref(), Some("Harbour Concerts"));
        assert!(request.lookup_key.is_none());
    }
}
