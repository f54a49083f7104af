//! Platform-wide data served by the backend gateway that is not tied to a
//! single user.

use {
    alloy_primitives::B256,
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

/// Pool curation lists maintained by the platform operators.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    pub incentivized_pools: Vec<B256>,
    pub blacklisted_pools: Vec<B256>,
    pub paused_pools: Vec<B256>,
    pub featured_pools: Vec<B256>,
}

impl GatewayConfig {
    pub fn is_blacklisted(&self, pool_id: &B256) -> bool {
        self.blacklisted_pools.contains(pool_id)
    }
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolData {
    #[serde_as(as = "DisplayFromStr")]
    pub total_liquidity: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_swap_volume: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_swap_fee: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub pool_count: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_fee_24h: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_volume_24h: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub beets_price: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub market_cap: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub circulating_supply: BigDecimal,
}
