use {
    alloy_primitives::Address,
    bigdecimal::BigDecimal,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::collections::{BTreeMap, HashMap},
};

/// Latest known price per token.
pub type TokenPrices = HashMap<Address, BigDecimal>;

/// Token prices per timestamp. Each entry holds one price per requested token,
/// in the order the tokens were requested.
pub type HistoricalPrices = BTreeMap<i64, Vec<BigDecimal>>;

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TokenPrice {
    pub address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub price: BigDecimal,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TokenPriceSeries {
    pub address: Address,
    pub prices: Vec<HistoricalPrice>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct HistoricalPrice {
    pub timestamp: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub price: BigDecimal,
}
