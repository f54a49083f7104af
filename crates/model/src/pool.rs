//! Pool records as served by the subgraph indexer, plus the attributes this
//! system derives for them before they are handed to consumers.

use {
    alloy_primitives::{Address, B256},
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::collections::HashMap,
};

/// Returns the address of a pool given its ID.
///
/// Pool IDs are the pool's own address followed by its specialization and a
/// nonce, so the address is the first 20 bytes of the ID.
pub fn pool_address(pool_id: &B256) -> Address {
    Address::from_slice(&pool_id[..20])
}

/// Pool kinds known to the indexer.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Serialize,
    Eq,
    PartialEq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
pub enum PoolType {
    Weighted,
    Stable,
    MetaStable,
    StablePhantom,
    ComposableStable,
    LiquidityBootstrapping,
    Investment,
    Element,
    Linear,
    AaveLinear,
    #[serde(rename = "ERC4626Linear")]
    #[strum(serialize = "ERC4626Linear")]
    Erc4626Linear,
    /// Any pool type this system does not model explicitly.
    #[serde(other)]
    Unknown,
}

impl PoolType {
    /// Pools whose own liquidity token is pre-minted and registered as one of
    /// the pool tokens.
    pub fn is_stable_phantom(&self) -> bool {
        matches!(self, Self::StablePhantom | Self::ComposableStable)
    }

    /// The pool types queried when looking up linear pools.
    pub fn linear_types() -> [Self; 3] {
        [Self::Linear, Self::AaveLinear, Self::Erc4626Linear]
    }
}

/// Token data for pools.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolToken {
    pub address: Address,
    #[serde(default)]
    pub symbol: String,
    pub decimals: u8,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: BigDecimal,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub weight: Option<BigDecimal>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub price_rate: Option<BigDecimal>,
}

/// Pool data from the subgraph indexer.
///
/// The `main_tokens`, `wrapped_tokens`, `linear_pool_tokens_map` and
/// `linear_pool_to_main_token_map` fields are never served by the indexer;
/// they are filled in by the decoration pipeline.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: B256,
    pub address: Address,
    pub pool_type: PoolType,
    #[serde_as(as = "DisplayFromStr")]
    pub swap_fee: BigDecimal,
    pub tokens_list: Vec<Address>,
    pub tokens: Vec<PoolToken>,
    #[serde_as(as = "DisplayFromStr")]
    pub total_liquidity: BigDecimal,
    #[serde_as(as = "DisplayFromStr")]
    pub total_shares: BigDecimal,
    #[serde(default)]
    pub main_index: Option<usize>,
    #[serde(default)]
    pub wrapped_index: Option<usize>,

    #[serde(default)]
    pub main_tokens: Vec<Option<Address>>,
    #[serde(default)]
    pub wrapped_tokens: Vec<Option<Address>>,
    #[serde(default)]
    pub linear_pool_tokens_map: HashMap<Address, PoolToken>,
    #[serde(default)]
    pub linear_pool_to_main_token_map: HashMap<Address, Address>,
}

impl Pool {
    /// The pool's own address as derived from its ID.
    pub fn derived_address(&self) -> Address {
        pool_address(&self.id)
    }

    /// The main token of a linear pool.
    pub fn main_token(&self) -> Option<Address> {
        self.main_index
            .and_then(|index| self.tokens_list.get(index))
            .copied()
    }

    /// The wrapped token of a linear pool.
    pub fn wrapped_token(&self) -> Option<Address> {
        self.wrapped_index
            .and_then(|index| self.tokens_list.get(index))
            .copied()
    }
}

/// A user's balance of a pool's liquidity token.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolShare {
    pub user_address: Address,
    pub pool_id: B256,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: BigDecimal,
}

/// A pool together with the connected user's share of it.
#[serde_as]
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolWithShares {
    #[serde(flatten)]
    pub pool: Pool,
    /// Value of the user's balance in the pool.
    #[serde_as(as = "DisplayFromStr")]
    pub shares: BigDecimal,
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json, std::str::FromStr};

    #[test]
    fn derives_pool_address_from_id() {
        let id = B256::from_str(
            "0x06df3b2bbb68adc8b0e302443692037ed9f91b42000000000000000000000063",
        )
        .unwrap();
        assert_eq!(
            pool_address(&id),
            Address::from_str("0x06Df3b2bbB68adc8B0e302443692037ED9f91b42").unwrap(),
        );
    }

    #[test]
    fn decode_pool() {
        let pool = serde_json::from_value::<Pool>(json!({
            "id": "0x2222222222222222222222222222222222222222000000000000000000000001",
            "address": "0x2222222222222222222222222222222222222222",
            "poolType": "AaveLinear",
            "swapFee": "0.0002",
            "tokensList": [
                "0x3333333333333333333333333333333333333333",
                "0x4444444444444444444444444444444444444444",
                "0x2222222222222222222222222222222222222222",
            ],
            "tokens": [
                {
                    "address": "0x3333333333333333333333333333333333333333",
                    "symbol": "DAI",
                    "decimals": 18,
                    "balance": "1000.5",
                    "weight": null,
                    "priceRate": "1",
                },
            ],
            "totalLiquidity": "2000.25",
            "totalShares": "1999",
            "mainIndex": 0,
            "wrappedIndex": 1,
        }))
        .unwrap();

        assert_eq!(pool.pool_type, PoolType::AaveLinear);
        assert!(PoolType::linear_types().contains(&pool.pool_type));
        assert_eq!(pool.derived_address(), pool.address);
        assert_eq!(pool.main_token(), Some(Address::repeat_byte(0x33)));
        assert_eq!(pool.wrapped_token(), Some(Address::repeat_byte(0x44)));
        assert_eq!(pool.total_liquidity, BigDecimal::from_str("2000.25").unwrap());
        assert_eq!(pool.tokens[0].weight, None);
        assert!(pool.wrapped_tokens.is_empty());
        assert!(pool.linear_pool_tokens_map.is_empty());
    }

    #[test]
    fn unknown_pool_types_are_tolerated() {
        assert_eq!(
            serde_json::from_value::<PoolType>(json!("Gyro2")).unwrap(),
            PoolType::Unknown,
        );
        assert_eq!(
            serde_json::from_value::<PoolType>(json!("ERC4626Linear")).unwrap(),
            PoolType::Erc4626Linear,
        );
        assert!(PoolType::ComposableStable.is_stable_phantom());
        assert!(!PoolType::Weighted.is_stable_phantom());
    }
}
