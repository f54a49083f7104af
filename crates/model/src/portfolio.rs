//! User portfolio snapshots served by the backend gateway.

use {
    alloy_primitives::{Address, B256},
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

/// A snapshot of a user's aggregate and per-pool/per-token metrics.
///
/// Historical snapshots share the same shape as the current one.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPortfolioData {
    pub timestamp: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_value: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_swap_fees: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_swap_volume: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub my_fees: BigDecimal,
    pub pools: Vec<UserPoolData>,
    pub tokens: Vec<UserTokenData>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPoolData {
    pub id: String,
    pub pool_id: B256,
    pub pool_address: Address,
    pub name: String,
    #[serde_as(as = "DisplayFromStr")]
    pub shares: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub percent_share: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_value: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub price_per_share: BigDecimal,
    pub tokens: Vec<UserTokenData>,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_fees: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_volume: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub my_fees: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub percent_of_portfolio: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub price_change: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub price_change_percent: BigDecimal,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTokenData {
    pub id: String,
    pub address: Address,
    pub symbol: String,
    pub name: String,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub price_per_token: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_value: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub percent_of_portfolio: BigDecimal,
}
