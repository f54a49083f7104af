//! Liquidity generation event (token launch) records.

use {
    alloy_primitives::Address,
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lge {
    pub id: String,
    pub address: Address,
    pub name: String,
    pub description: String,
    pub token_contract_address: Address,
    pub collateral_token_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub token_amount: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub collateral_amount: BigDecimal,
    pub token_end_weight: u32,
    pub collateral_end_weight: u32,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_fee_percentage: BigDecimal,
    /// Unix timestamp in seconds.
    pub start_date: i64,
    /// Unix timestamp in seconds.
    pub end_date: i64,
    pub admin_address: Address,
    pub admin_is_multisig: bool,
    pub website_url: String,
    pub token_icon_url: String,
    pub banner_image_url: String,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub medium_url: Option<String>,
    #[serde(default)]
    pub discord_url: Option<String>,
    #[serde(default)]
    pub telegram_url: Option<String>,
    pub chain_id: String,
}

/// Where a launch is in its lifecycle relative to a point in time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LgeStatus {
    Upcoming,
    Active,
    Ended,
}

impl Lge {
    pub fn status_at(&self, now: i64) -> LgeStatus {
        if now < self.start_date {
            LgeStatus::Upcoming
        } else if now < self.end_date {
            LgeStatus::Active
        } else {
            LgeStatus::Ended
        }
    }
}
