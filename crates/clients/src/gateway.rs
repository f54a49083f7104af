//! Client for the backend gateway serving prices, portfolio analytics, farms,
//! launches and platform configuration.

use {
    crate::graphql::{GraphQlClient, lower_hex},
    alloy_primitives::Address,
    anyhow::{Context as _, Result},
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    model::{
        config::{GatewayConfig, ProtocolData},
        farm::{Farm, FarmUser},
        lge::Lge,
        portfolio::UserPortfolioData,
        prices::{HistoricalPrices, TokenPrice, TokenPriceSeries, TokenPrices},
    },
    reqwest::{Client, IntoUrl},
    serde::Deserialize,
    std::collections::HashMap,
};

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn latest_token_prices(&self) -> Result<TokenPrices>;

    /// Price history of the given tokens over the last `days`, aligned onto
    /// the timestamps of the first token. See [`align_price_series`].
    async fn historical_token_prices(
        &self,
        addresses: Vec<Address>,
        days: u32,
    ) -> Result<HistoricalPrices>;

    async fn user_portfolio_data(&self, account: Address) -> Result<UserPortfolioData>;

    async fn user_portfolio_historical_data(
        &self,
        account: Address,
    ) -> Result<Vec<UserPortfolioData>>;

    async fn farms(&self) -> Result<Vec<Farm>>;

    async fn farm_users(&self, account: Address) -> Result<Vec<FarmUser>>;

    async fn lges(&self) -> Result<Vec<Lge>>;

    async fn lge(&self, id: String) -> Result<Option<Lge>>;

    async fn protocol_data(&self) -> Result<ProtocolData>;

    async fn config(&self) -> Result<GatewayConfig>;
}

/// A client to the backend gateway.
pub struct GatewayClient(GraphQlClient);

impl GatewayClient {
    pub fn new(url: impl IntoUrl, client: Client) -> Result<Self> {
        Ok(Self(GraphQlClient::new(url, client)?))
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn latest_token_prices(&self) -> Result<TokenPrices> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            latest_token_prices: Vec<TokenPrice>,
        }

        let data = self
            .0
            .query::<Data>(queries::LATEST_TOKEN_PRICES, None)
            .await
            .context("latest token prices")?;
        Ok(data
            .latest_token_prices
            .into_iter()
            .map(|token| (token.address, token.price))
            .collect())
    }

    async fn historical_token_prices(
        &self,
        addresses: Vec<Address>,
        days: u32,
    ) -> Result<HistoricalPrices> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            historical_token_prices: Vec<TokenPriceSeries>,
        }

        let data = self
            .0
            .query::<Data>(
                queries::HISTORICAL_TOKEN_PRICES,
                Some(json_map! {
                    "addresses" => addresses.iter().map(lower_hex).collect::<Vec<_>>(),
                    "days" => days,
                }),
            )
            .await
            .context("historical token prices")?;
        Ok(align_price_series(&addresses, data.historical_token_prices))
    }

    async fn user_portfolio_data(&self, account: Address) -> Result<UserPortfolioData> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            user_portfolio_data: UserPortfolioData,
        }

        Ok(self
            .0
            .query_for_account::<Data>(account, queries::USER_PORTFOLIO_DATA, None)
            .await
            .context("user portfolio data")?
            .user_portfolio_data)
    }

    async fn user_portfolio_historical_data(
        &self,
        account: Address,
    ) -> Result<Vec<UserPortfolioData>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            user_portfolio_historical_data: Vec<UserPortfolioData>,
        }

        Ok(self
            .0
            .query_for_account::<Data>(account, queries::USER_PORTFOLIO_HISTORICAL_DATA, None)
            .await
            .context("user portfolio historical data")?
            .user_portfolio_historical_data)
    }

    async fn farms(&self) -> Result<Vec<Farm>> {
        #[derive(Deserialize)]
        struct Data {
            farms: Vec<Farm>,
        }

        Ok(self
            .0
            .query::<Data>(queries::FARMS, None)
            .await
            .context("farms")?
            .farms)
    }

    async fn farm_users(&self, account: Address) -> Result<Vec<FarmUser>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            farm_users: Vec<FarmUser>,
        }

        Ok(self
            .0
            .query_for_account::<Data>(account, queries::FARM_USERS, None)
            .await
            .context("farm users")?
            .farm_users)
    }

    async fn lges(&self) -> Result<Vec<Lge>> {
        #[derive(Deserialize)]
        struct Data {
            lges: Vec<Lge>,
        }

        Ok(self
            .0
            .query::<Data>(queries::LGES, None)
            .await
            .context("launches")?
            .lges)
    }

    async fn lge(&self, id: String) -> Result<Option<Lge>> {
        #[derive(Deserialize)]
        struct Data {
            lge: Option<Lge>,
        }

        Ok(self
            .0
            .query::<Data>(queries::LGE, Some(json_map! { "id" => id.clone() }))
            .await
            .with_context(|| format!("launch {id}"))?
            .lge)
    }

    async fn protocol_data(&self) -> Result<ProtocolData> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            protocol_data: ProtocolData,
        }

        Ok(self
            .0
            .query::<Data>(queries::PROTOCOL_DATA, None)
            .await
            .context("protocol data")?
            .protocol_data)
    }

    async fn config(&self) -> Result<GatewayConfig> {
        #[derive(Deserialize)]
        struct Data {
            config: GatewayConfig,
        }

        Ok(self
            .0
            .query::<Data>(queries::CONFIG, None)
            .await
            .context("gateway config")?
            .config)
    }
}

/// Aligns per-token price series onto the timestamps of the first token's
/// series.
///
/// The result holds, for every timestamp of the first series, one price per
/// entry of `addresses`. A token without a price at one of those timestamps
/// gets a price of zero; timestamps only present in later series are dropped.
pub fn align_price_series(
    addresses: &[Address],
    series: Vec<TokenPriceSeries>,
) -> HistoricalPrices {
    let by_address = series
        .into_iter()
        .map(|series| {
            let prices = series
                .prices
                .into_iter()
                .map(|price| (price.timestamp, price.price))
                .collect::<HashMap<_, _>>();
            (series.address, prices)
        })
        .collect::<HashMap<_, _>>();

    let Some(first) = addresses.first().and_then(|first| by_address.get(first)) else {
        return HistoricalPrices::new();
    };

    first
        .keys()
        .map(|timestamp| {
            let prices = addresses
                .iter()
                .map(|address| {
                    by_address
                        .get(address)
                        .and_then(|prices| prices.get(timestamp))
                        .cloned()
                        .unwrap_or_else(|| BigDecimal::from(0))
                })
                .collect();
            (*timestamp, prices)
        })
        .collect()
}

mod queries {
    pub const LATEST_TOKEN_PRICES: &str = r#"
        query LatestTokenPrices {
            latestTokenPrices {
                address
                price
            }
        }
    "#;

    pub const HISTORICAL_TOKEN_PRICES: &str = r#"
        query HistoricalTokenPrices($addresses: [String!]!, $days: Int!) {
            historicalTokenPrices(addresses: $addresses, days: $days) {
                address
                prices {
                    timestamp
                    price
                }
            }
        }
    "#;

    pub const USER_PORTFOLIO_DATA: &str = r#"
        query UserPortfolioData {
            userPortfolioData {
                timestamp
                totalValue
                totalSwapFees
                totalSwapVolume
                myFees
                pools {
                    id
                    poolId
                    poolAddress
                    name
                    shares
                    percentShare
                    totalValue
                    pricePerShare
                    tokens {
                        id
                        address
                        symbol
                        name
                        balance
                        pricePerToken
                        totalValue
                        percentOfPortfolio
                    }
                    swapFees
                    swapVolume
                    myFees
                    percentOfPortfolio
                    priceChange
                    priceChangePercent
                }
                tokens {
                    id
                    address
                    symbol
                    name
                    balance
                    pricePerToken
                    totalValue
                    percentOfPortfolio
                }
            }
        }
    "#;

    pub const USER_PORTFOLIO_HISTORICAL_DATA: &str = r#"
        query UserPortfolioHistoricalData {
            userPortfolioHistoricalData {
                timestamp
                totalValue
                totalSwapFees
                totalSwapVolume
                myFees
                pools {
                    id
                    poolId
                    poolAddress
                    name
                    shares
                    percentShare
                    totalValue
                    pricePerShare
                    tokens {
                        id
                        address
                        symbol
                        name
                        balance
                        pricePerToken
                        totalValue
                        percentOfPortfolio
                    }
                    swapFees
                    swapVolume
                    myFees
                    percentOfPortfolio
                    priceChange
                    priceChangePercent
                }
                tokens {
                    id
                    address
                    symbol
                    name
                    balance
                    pricePerToken
                    totalValue
                    percentOfPortfolio
                }
            }
        }
    "#;

    pub const FARMS: &str = r#"
        query Farms {
            farms {
                id
                pair
                allocPoint
                slpBalance
                rewarder {
                    id
                    rewardToken
                    rewardPerSecond
                }
            }
        }
    "#;

    pub const FARM_USERS: &str = r#"
        query FarmUsers {
            farmUsers {
                id
                farmId
                pair
                amount
                rewardDebt
                beetsHarvested
            }
        }
    "#;

    pub const LGES: &str = r#"
        query Lges {
            lges {
                id
                address
                name
                description
                tokenContractAddress
                collateralTokenAddress
                tokenAmount
                collateralAmount
                tokenEndWeight
                collateralEndWeight
                swapFeePercentage
                startDate
                endDate
                adminAddress
                adminIsMultisig
                websiteUrl
                tokenIconUrl
                bannerImageUrl
                twitterUrl
                mediumUrl
                discordUrl
                telegramUrl
                chainId
            }
        }
    "#;

    pub const LGE: &str = r#"
        query Lge($id: ID!) {
            lge(id: $id) {
                id
                address
                name
                description
                tokenContractAddress
                collateralTokenAddress
                tokenAmount
                collateralAmount
                tokenEndWeight
                collateralEndWeight
                swapFeePercentage
                startDate
                endDate
                adminAddress
                adminIsMultisig
                websiteUrl
                tokenIconUrl
                bannerImageUrl
                twitterUrl
                mediumUrl
                discordUrl
                telegramUrl
                chainId
            }
        }
    "#;

    pub const PROTOCOL_DATA: &str = r#"
        query ProtocolData {
            protocolData {
                totalLiquidity
                totalSwapVolume
                totalSwapFee
                poolCount
                swapFee24h
                swapVolume24h
                beetsPrice
                marketCap
                circulatingSupply
            }
        }
    "#;

    pub const CONFIG: &str = r#"
        query Config {
            config {
                incentivizedPools
                blacklistedPools
                pausedPools
                featuredPools
            }
        }
    "#;
}
