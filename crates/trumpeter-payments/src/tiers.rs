//! Sponsor Tiers
//!
//! The donation catalog is a fixed table in code: four one-time sponsor
//! tiers plus the legacy buck-a-month subscription shortcut. Amounts are
//! minor units (cents).

use serde::{Deserialize, Serialize};

/// Line-item name for the legacy $1/month subscription.
pub const BUCK_A_MONTH_NAME: &str = "Buck-A-Month Sponsor - Alert Bay Trumpeter";

/// Line-item description for the legacy $1/month subscription.
pub const BUCK_A_MONTH_DESCRIPTION: &str =
    "Monthly $1 CAD subscription to support Jerry Higginson, the Alert Bay Trumpeter";

/// Amount for the legacy $1/month subscription, in cents.
pub const BUCK_A_MONTH_AMOUNT: i64 = 100;

/// Fallback description for ad-hoc subscription checkouts.
pub const SUBSCRIPTION_DESCRIPTION: &str =
    "Monthly subscription to support Jerry Higginson, the Alert Bay Trumpeter";

/// One-time sponsor tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorTier {
    Copper,
    Bronze,
    Silver,
    Gold,
}

impl SponsorTier {
    /// All tiers, cheapest first.
    pub const ALL: [SponsorTier; 4] = [
        SponsorTier::Copper,
        SponsorTier::Bronze,
        SponsorTier::Silver,
        SponsorTier::Gold,
    ];

    /// Resolve a wire identifier. Keys are exact and lowercase.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "copper" => Some(SponsorTier::Copper),
            "bronze" => Some(SponsorTier::Bronze),
            "silver" => Some(SponsorTier::Silver),
            "gold" => Some(SponsorTier::Gold),
            _ => None,
        }
    }

    /// The wire identifier for this tier.
    pub fn as_key(&self) -> &'static str {
        match self {
            SponsorTier::Copper => "copper",
            SponsorTier::Bronze => "bronze",
            SponsorTier::Silver => "silver",
            SponsorTier::Gold => "gold",
        }
    }

    /// Donation amount in cents.
    pub fn amount(&self) -> i64 {
        match self {
            SponsorTier::Copper => 1000,
            SponsorTier::Bronze => 2500,
            SponsorTier::Silver => 5000,
            SponsorTier::Gold => 10000,
        }
    }

    /// Display label for the tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            SponsorTier::Copper => "Copper Sponsor",
            SponsorTier::Bronze => "Bronze Sponsor",
            SponsorTier::Silver => "Silver Sponsor",
            SponsorTier::Gold => "Gold Sponsor",
        }
    }

    /// Checkout line-item name.
    pub fn product_name(&self) -> String {
        format!("{} - Alert Bay Trumpeter", self.display_name())
    }

    /// Checkout line-item description.
    pub fn product_description(&self) -> String {
        format!(
            "Support Jerry Higginson, the Alert Bay Trumpeter, with a {} donation.",
            self.display_name().to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_amounts() {
        assert_eq!(SponsorTier::Copper.amount(), 1000);
        assert_eq!(SponsorTier::Bronze.amount(), 2500);
        assert_eq!(SponsorTier::Silver.amount(), 5000);
        assert_eq!(SponsorTier::Gold.amount(), 10000);
    }

    #[test]
    fn test_tiers_ordered_cheapest_first() {
        let amounts: Vec<i64> = SponsorTier::ALL.iter().map(SponsorTier::amount).collect();
        assert!(amounts.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_from_key_round_trip() {
        for tier in SponsorTier::ALL {
            assert_eq!(SponsorTier::from_key(tier.as_key()), Some(tier));
        }
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert_eq!(SponsorTier::from_key("platinum"), None);
        assert_eq!(SponsorTier::from_key("GOLD"), None);
        assert_eq!(SponsorTier::from_key("Gold Sponsor"), None);
        assert_eq!(SponsorTier::from_key(""), None);
    }

    #[test]
    fn test_line_item_naming() {
        assert_eq!(
            SponsorTier::Gold.product_name(),
            "Gold Sponsor - Alert Bay Trumpeter"
        );
        assert_eq!(
            SponsorTier::Copper.product_description(),
            "Support Jerry Higginson, the Alert Bay Trumpeter, with a copper sponsor donation."
        );
    }
}
