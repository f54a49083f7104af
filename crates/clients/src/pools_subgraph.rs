//! Module containing the subgraph indexer client used for retrieving pools and
//! the pool shares held by users.

use {
    crate::graphql::{GraphQlClient, lower_hex},
    alloy_primitives::{Address, B256},
    anyhow::{Result, bail},
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    model::pool::{Pool, PoolShare, PoolType},
    reqwest::{Client, IntoUrl},
    serde::{Deserialize, de::DeserializeOwned},
    serde_json::{Map, Value, json},
    serde_with::{DisplayFromStr, serde_as},
};

/// The page size when querying pools.
#[cfg(not(test))]
const QUERY_PAGE_SIZE: usize = 1000;
#[cfg(test)]
const QUERY_PAGE_SIZE: usize = 10;

/// Filter applied when fetching pools. Unset fields do not constrain the
/// result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolsFilter {
    pub ids: Option<Vec<B256>>,
    pub addresses: Option<Vec<Address>>,
    pub pool_types: Option<Vec<PoolType>>,
    pub min_total_shares: Option<BigDecimal>,
}

impl PoolsFilter {
    fn to_where(&self) -> Map<String, Value> {
        let mut filter = Map::new();
        if let Some(ids) = &self.ids {
            filter.insert("id_in".into(), json!(ids));
        }
        if let Some(addresses) = &self.addresses {
            filter.insert(
                "address_in".into(),
                json!(addresses.iter().map(lower_hex).collect::<Vec<_>>()),
            );
        }
        if let Some(pool_types) = &self.pool_types {
            filter.insert(
                "poolType_in".into(),
                json!(
                    pool_types
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                ),
            );
        }
        if let Some(min_total_shares) = &self.min_total_shares {
            filter.insert("totalShares_gt".into(), json!(min_total_shares.to_string()));
        }
        filter
    }
}

/// Filter applied when fetching pool shares.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolSharesFilter {
    pub user_address: Address,
}

impl PoolSharesFilter {
    fn to_where(&self) -> Map<String, Value> {
        json_map! {
            "userAddress" => lower_hex(&self.user_address),
            "balance_gt" => "0",
        }
    }
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait PoolsSubgraphApi: Send + Sync {
    /// Retrieves all pools matching the filter.
    async fn pools(&self, filter: PoolsFilter) -> Result<Vec<Pool>>;

    /// Retrieves all pools of the linear family.
    async fn linear_pools(&self) -> Result<Vec<Pool>>;

    /// Retrieves the non-zero pool shares matching the filter.
    async fn pool_shares(&self, filter: PoolSharesFilter) -> Result<Vec<PoolShare>>;
}

/// A client to the pools subgraph.
///
/// This client is not implemented to allow general GraphQL queries, but instead
/// implements high-level methods that perform GraphQL queries under the hood.
pub struct PoolsSubgraphClient(GraphQlClient);

impl PoolsSubgraphClient {
    /// Creates a new subgraph client for the specified chain ID.
    pub fn for_chain(chain_id: u64, client: Client) -> Result<Self> {
        let url = match chain_id {
            10 => "https://api.thegraph.com/subgraphs/name/beethovenxfi/beethovenx-optimism",
            250 => "https://api.thegraph.com/subgraphs/name/beethovenxfi/beethovenx",
            _ => bail!("unsupported chain {chain_id}"),
        };
        Self::new(url, client)
    }

    /// Creates a new subgraph client for an explicit subgraph URL.
    pub fn new(url: impl IntoUrl, client: Client) -> Result<Self> {
        Ok(Self(GraphQlClient::new(url, client)?))
    }

    /// Pages through all entities matching `filter`.
    ///
    /// We do paging by last ID instead of using `skip`. This is the suggested
    /// approach to paging best performance:
    /// <https://thegraph.com/docs/graphql-api#pagination>
    async fn query_all<T, Id>(
        &self,
        query: &str,
        filter: Map<String, Value>,
        id_of: impl Fn(&T) -> Id,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        Id: serde::Serialize,
    {
        let mut items = Vec::new();
        let mut last_id = Value::String(String::new());

        loop {
            let mut page_filter = filter.clone();
            page_filter.insert("id_gt".into(), last_id.clone());
            let page = self
                .0
                .query::<Page<T>>(
                    query,
                    Some(json_map! {
                        "pageSize" => QUERY_PAGE_SIZE,
                        "where" => Value::Object(page_filter),
                    }),
                )
                .await?
                .items;
            let no_more_pages = page.len() != QUERY_PAGE_SIZE;
            if let Some(last) = page.last() {
                last_id = json!(id_of(last));
            }

            items.extend(page);

            if no_more_pages {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl PoolsSubgraphApi for PoolsSubgraphClient {
    async fn pools(&self, filter: PoolsFilter) -> Result<Vec<Pool>> {
        let pools = self
            .query_all(pools_query::QUERY, filter.to_where(), |pool: &Pool| {
                pool.id
            })
            .await?;
        tracing::debug!(count = pools.len(), ?filter, "fetched pools");
        Ok(pools)
    }

    async fn linear_pools(&self) -> Result<Vec<Pool>> {
        self.pools(PoolsFilter {
            pool_types: Some(PoolType::linear_types().to_vec()),
            ..Default::default()
        })
        .await
    }

    async fn pool_shares(&self, filter: PoolSharesFilter) -> Result<Vec<PoolShare>> {
        let shares = self
            .query_all(
                pool_shares_query::QUERY,
                filter.to_where(),
                |share: &pool_shares_query::PoolShareData| share.id.clone(),
            )
            .await?;
        tracing::debug!(count = shares.len(), user = %filter.user_address, "fetched pool shares");
        Ok(shares.into_iter().map(PoolShare::from).collect())
    }
}

/// A page of entities. Queries alias their collection to `items`.
#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

mod pools_query {
    pub const QUERY: &str = r#"
        query Pools($pageSize: Int, $where: Pool_filter) {
            items: pools(
                first: $pageSize
                orderBy: id
                orderDirection: asc
                where: $where
            ) {
                id
                address
                poolType
                swapFee
                tokensList
                totalLiquidity
                totalShares
                mainIndex
                wrappedIndex
                tokens {
                    address
                    symbol
                    decimals
                    balance
                    weight
                    priceRate
                }
            }
        }
    "#;
}

mod pool_shares_query {
    use super::*;

    pub const QUERY: &str = r#"
        query PoolShares($pageSize: Int, $where: PoolShare_filter) {
            items: poolShares(
                first: $pageSize
                orderBy: id
                orderDirection: asc
                where: $where
            ) {
                id
                userAddress { id }
                poolId { id }
                balance
            }
        }
    "#;

    #[serde_as]
    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct PoolShareData {
        pub id: String,
        pub user_address: Entity<Address>,
        pub pool_id: Entity<B256>,
        #[serde_as(as = "DisplayFromStr")]
        pub balance: BigDecimal,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    pub struct Entity<T> {
        pub id: T,
    }

    impl From<PoolShareData> for PoolShare {
        fn from(data: PoolShareData) -> Self {
            Self {
                user_address: data.user_address.id,
                pool_id: data.pool_id.id,
                balance: data.balance,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, reqwest::Client, std::str::FromStr};

    #[test]
    fn decode_pool_shares_page() {
        let pool_id = "0x2222222222222222222222222222222222222222000000000000000000000001";
        let user = "0x1111111111111111111111111111111111111111";
        let page = serde_json::from_value::<Page<pool_shares_query::PoolShareData>>(json!({
            "items": [
                {
                    "id": format!("{pool_id}-{user}"),
                    "userAddress": { "id": user },
                    "poolId": { "id": pool_id },
                    "balance": "13.37",
                },
            ],
        }))
        .unwrap();

        let shares = page
            .items
            .into_iter()
            .map(PoolShare::from)
            .collect::<Vec<_>>();
        assert_eq!(
            shares,
            vec![PoolShare {
                user_address: Address::repeat_byte(0x11),
                pool_id: B256::from_str(
                    "0x2222222222222222222222222222222222222222000000000000000000000001"
                )
                .unwrap(),
                balance: BigDecimal::from_str("13.37").unwrap(),
            }],
        );
    }

    #[test]
    fn pools_filter_only_constrains_set_fields() {
        assert!(PoolsFilter::default().to_where().is_empty());

        let filter = PoolsFilter {
            addresses: Some(vec![
                "0x06Df3b2bbB68adc8B0e302443692037ED9f91b42"
                    .parse()
                    .unwrap(),
            ]),
            pool_types: Some(PoolType::linear_types().to_vec()),
            min_total_shares: Some(BigDecimal::from_str("0.01").unwrap()),
            ..Default::default()
        };
        assert_eq!(
            Value::Object(filter.to_where()),
            json!({
                "address_in": ["0x06df3b2bbb68adc8b0e302443692037ed9f91b42"],
                "poolType_in": ["Linear", "AaveLinear", "ERC4626Linear"],
                "totalShares_gt": "0.01",
            }),
        );
    }

    #[test]
    fn pool_shares_filter_uses_lower_case_user() {
        let filter = PoolSharesFilter {
            user_address: "0x06Df3b2bbB68adc8B0e302443692037ED9f91b42"
                .parse()
                .unwrap(),
        };
        assert_eq!(
            Value::Object(filter.to_where()),
            json!({
                "userAddress": "0x06df3b2bbb68adc8b0e302443692037ed9f91b42",
                "balance_gt": "0",
            }),
        );
    }

    #[test]
    fn unsupported_chain() {
        assert!(PoolsSubgraphClient::for_chain(1337, Client::new()).is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn pools_subgraph_query() {
        let client = PoolsSubgraphClient::for_chain(250, Client::new()).unwrap();
        let linear_pools = client.linear_pools().await.unwrap();
        println!("Retrieved {} linear pools", linear_pools.len());
        for pool in linear_pools.iter().take(5) {
            println!(
                "- {:?} {} main {:?} wrapped {:?}",
                pool.pool_type,
                pool.address,
                pool.main_token(),
                pool.wrapped_token(),
            );
        }
    }
}
