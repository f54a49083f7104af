use {
    alloy_primitives::Address,
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

/// A liquidity mining farm staking a pool's liquidity token.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: String,
    pub pair: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub alloc_point: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub slp_balance: BigDecimal,
    #[serde(default)]
    pub rewarder: Option<FarmRewarder>,
}

/// Secondary reward emitted by a farm on top of the governance token.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmRewarder {
    pub id: String,
    pub reward_token: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub reward_per_second: BigDecimal,
}

/// A user's position in a farm.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmUser {
    pub id: String,
    pub farm_id: String,
    pub pair: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub reward_debt: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub beets_harvested: BigDecimal,
}
