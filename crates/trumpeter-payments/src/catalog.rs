//! Product Catalog Projection
//!
//! Queries Stripe's live catalog (active products with their default price
//! expanded) and projects it into the two card shapes the site renders.
//! There is no cache: every call re-queries the provider, so dashboard edits
//! show up immediately.

use serde::{Deserialize, Serialize};
use stripe::{Expandable, ListProducts, Price, PriceType, Product, RecurringInterval};

use crate::client::StripeClient;
use crate::error::Result;

/// One-time donation card
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OneTimeProduct {
    /// Provider product id
    pub id: String,

    /// Display name
    pub name: String,

    /// Optional blurb
    pub description: Option<String>,

    /// Image URLs, possibly empty
    pub images: Vec<String>,

    /// Default price details
    pub price: PriceSummary,
}

/// Price block on a one-time card
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Provider price id, used for direct price checkout
    pub id: String,

    /// Amount in cents, absent for metered prices
    pub amount: Option<i64>,

    /// Lowercase ISO currency code
    pub currency: String,
}

/// Monthly subscription card
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionProduct {
    /// Provider product id
    pub id: String,

    /// Display name
    pub name: String,

    /// Optional blurb
    pub description: Option<String>,

    /// Amount in cents, absent for metered prices
    pub price: Option<i64>,

    /// Lowercase ISO currency code
    pub currency: String,

    /// Price lookup key, when the dashboard assigned one
    pub lookup_key: Option<String>,

    /// Image URLs, possibly empty
    pub images: Vec<String>,
}

impl StripeClient {
    /// One-time donation cards, in provider order.
    pub async fn list_one_time_products(&self) -> Result<Vec<OneTimeProduct>> {
        let products = self.list_active_products().await?;
        let cards = project_one_time(&products);
        tracing::debug!(count = cards.len(), "Projected one-time products");
        Ok(cards)
    }

    /// Monthly subscription cards, cheapest first.
    pub async fn list_subscription_products(&self) -> Result<Vec<SubscriptionProduct>> {
        let products = self.list_active_products().await?;
        let cards = project_subscriptions(&products);
        tracing::debug!(count = cards.len(), "Projected subscription products");
        Ok(cards)
    }

    /// Active products with `default_price` expanded. Listing is an
    /// idempotent read, so transient provider failures are retried.
    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let list = self
            .with_retry("list_products", || {
                let client = self.inner().clone();
                async move {
                    let mut params = ListProducts::new();
                    params.active = Some(true);
                    params.expand = &["data.default_price"];
                    Product::list(&client, &params).await
                }
            })
            .await?;

        Ok(list.data)
    }
}

/// The expanded default price, if the product carries one.
fn default_price(product: &Product) -> Option<&Price> {
    match product.default_price.as_ref() {
        Some(Expandable::Object(price)) => Some(price),
        _ => None,
    }
}

/// Project products whose default price is one-time.
pub fn project_one_time(products: &[Product]) -> Vec<OneTimeProduct> {
    products
        .iter()
        .filter_map(|product| {
            let price = default_price(product)?;
            if price.type_ != Some(PriceType::OneTime) {
                return None;
            }

            Some(OneTimeProduct {
                id: product.id.to_string(),
                name: product.name.clone().unwrap_or_default(),
                description: product.description.clone(),
                images: product.images.clone().unwrap_or_default(),
                price: PriceSummary {
                    id: price.id.to_string(),
                    amount: price.unit_amount,
                    currency: price.currency.map(|c| c.to_string()).unwrap_or_default(),
                },
            })
        })
        .collect()
}

/// Project products with a monthly recurring default price, sorted by
/// amount ascending. Prices without an amount sort first.
pub fn project_subscriptions(products: &[Product]) -> Vec<SubscriptionProduct> {
    let mut cards: Vec<SubscriptionProduct> = products
        .iter()
        .filter_map(|product| {
            let price = default_price(product)?;
            if price.type_ != Some(PriceType::Recurring) {
                return None;
            }

            let monthly = price
                .recurring
                .as_ref()
                .is_some_and(|recurring| recurring.interval == RecurringInterval::Month);
            if !monthly {
                return None;
            }

            Some(SubscriptionProduct {
                id: product.id.to_string(),
                name: product.name.clone().unwrap_or_default(),
                description: product.description.clone(),
                price: price.unit_amount,
                currency: price.currency.map(|c| c.to_string()).unwrap_or_default(),
                lookup_key: price.lookup_key.clone(),
                images: product.images.clone().unwrap_or_default(),
            })
        })
        .collect();

    cards.sort_by_key(|card| card.price.unwrap_or(0));
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripe::{Currency, Recurring};

    fn product(id: &str, name: &str, price: Option<Price>) -> Product {
        Product {
            id: id.parse().unwrap(),
            name: Some(name.to_string()),
            description: Some(format!("{name} description")),
            images: Some(vec![format!("https://img.test/{id}.jpg")]),
            default_price: price.map(|p| Expandable::Object(Box::new(p))),
            ..Default::default()
        }
    }

    fn one_time_price(id: &str, amount: i64) -> Price {
        Price {
            id: id.parse().unwrap(),
            unit_amount: Some(amount),
            currency: Some(Currency::CAD),
            type_: Some(PriceType::OneTime),
            ..Default::default()
        }
    }

    fn monthly_price(id: &str, amount: Option<i64>) -> Price {
        Price {
            id: id.parse().unwrap(),
            unit_amount: amount,
            currency: Some(Currency::CAD),
            type_: Some(PriceType::Recurring),
            recurring: Some(Recurring {
                interval: RecurringInterval::Month,
                ..Default::default()
            }),
            lookup_key: Some(format!("{id}_key")),
            ..Default::default()
        }
    }

    #[test]
    fn test_projections_are_exclusive() {
        let products = vec![
            product("prod_one", "Sheet Music", Some(one_time_price("price_one", 1500))),
            product("prod_sub", "Harbour Club", Some(monthly_price("price_sub", Some(500)))),
        ];

        let one_time = project_one_time(&products);
        assert_eq!(one_time.len(), 1);
        assert_eq!(one_time[0].id, "prod_one");

        let subs = project_subscriptions(&products);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "prod_sub");
    }

    #[test]
    fn test_products_without_expanded_price_excluded() {
        let mut unexpanded = product("prod_flat", "Flat", None);
        unexpanded.default_price = Some(Expandable::Id("price_x".parse().unwrap()));

        let products = vec![product("prod_none", "None", None), unexpanded];

        assert!(project_one_time(&products).is_empty());
        assert!(project_subscriptions(&products).is_empty());
    }

    #[test]
    fn test_yearly_subscriptions_excluded() {
        let mut yearly = monthly_price("price_year", Some(9000));
        yearly.recurring = Some(Recurring {
            interval: RecurringInterval::Year,
            ..Default::default()
        });

        let products = vec![product("prod_year", "Yearly", Some(yearly))];
        assert!(project_subscriptions(&products).is_empty());
    }

    #[test]
    fn test_subscriptions_sorted_cheapest_first() {
        let products = vec![
            product("prod_c", "C", Some(monthly_price("price_c", Some(5000)))),
            product("prod_a", "A", Some(monthly_price("price_a", None))),
            product("prod_b", "B", Some(monthly_price("price_b", Some(100)))),
        ];

        let subs = project_subscriptions(&products);
        let order: Vec<&str> = subs.iter().map(|card| card.id.as_str()).collect();
        // A missing amount sorts as zero, ahead of every priced card.
        assert_eq!(order, ["prod_a", "prod_b", "prod_c"]);
    }

    #[test]
    fn test_one_time_card_fields() {
        let products = vec![product(
            "prod_one",
            "Sheet Music",
            Some(one_time_price("price_one", 1500)),
        )];

        let card = &project_one_time(&products)[0];
        assert_eq!(card.name, "Sheet Music");
        assert_eq!(card.description.as_deref(), Some("Sheet Music description"));
        assert_eq!(card.images, vec!["https://img.test/prod_one.jpg"]);
        assert_eq!(card.price.id, "price_one");
        assert_eq!(card.price.amount, Some(1500));
        assert_eq!(card.price.currency, "cad");
    }

    #[test]
    fn test_card_wire_shapes() {
        let products = vec![
            product("prod_one", "Sheet Music", Some(one_time_price("price_one", 1500))),
            product("prod_sub", "Harbour Club", Some(monthly_price("price_sub", Some(500)))),
        ];

        let one_time = serde_json::to_value(&project_one_time(&products)[0]).unwrap();
        assert_eq!(one_time["price"]["amount"], 1500);
        assert_eq!(one_time["price"]["currency"], "cad");

        let sub = serde_json::to_value(&project_subscriptions(&products)[0]).unwrap();
        assert_eq!(sub["price"], 500);
        assert_eq!(sub["lookup_key"], "price_sub_key");
    }
}
