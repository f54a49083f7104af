//! The connected user's pools, valued at current token prices.

use {
    crate::{
        pool_decoration,
        reactive::{self, QueryHandle},
        session::{SessionProvider, TokenListsState},
        token_cache::TokenPriceLoading,
    },
    alloy_primitives::{Address, B256},
    anyhow::Result,
    bigdecimal::{BigDecimal, Zero},
    clients::pools_subgraph::{PoolSharesFilter, PoolsFilter, PoolsSubgraphApi},
    itertools::Itertools,
    model::pool::{Pool, PoolWithShares},
    serde::Serialize,
    std::{collections::HashMap, sync::Arc},
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPools {
    pub pools: Vec<PoolWithShares>,
    /// Every token the pools reference, including linear pool tokens and the
    /// pools' own liquidity tokens.
    pub tokens: Vec<Address>,
    pub total_invested_amount: String,
}

pub struct UserPoolsFetcher {
    subgraph: Arc<dyn PoolsSubgraphApi>,
    tokens: Arc<dyn TokenPriceLoading>,
}

impl UserPoolsFetcher {
    pub fn new(subgraph: Arc<dyn PoolsSubgraphApi>, tokens: Arc<dyn TokenPriceLoading>) -> Self {
        Self { subgraph, tokens }
    }

    pub async fn fetch(&self, account: Address) -> Result<UserPools> {
        let (shares, pools, linear_pools) = futures::try_join!(
            self.subgraph.pool_shares(PoolSharesFilter {
                user_address: account,
            }),
            self.subgraph.pools(PoolsFilter::default()),
            self.subgraph.linear_pools(),
        )?;

        let balances = shares
            .into_iter()
            .map(|share| (share.pool_id, share.balance))
            .collect::<HashMap<_, _>>();

        // Every pool is decorated and its tokens loaded so prices stay
        // consistent across the platform, not only for the user's pools.
        let pools = pool_decoration::decorate_pools(pools, &linear_pools)?;
        let tokens = referenced_tokens(&pools);
        self.tokens.inject_tokens(tokens.clone()).await?;

        let pools = pools
            .into_iter()
            .filter(|pool| balances.contains_key(&pool.id))
            .collect::<Vec<_>>();
        tracing::debug!(%account, pools = pools.len(), "found user pools");
        let pools = pool_decoration::decorate_values(pools, &self.tokens.prices());

        let pools = pools
            .into_iter()
            .map(|pool| {
                let shares = share_value(&pool, &balances);
                PoolWithShares { pool, shares }
            })
            .collect::<Vec<_>>();
        let total_invested_amount = pools
            .iter()
            .map(|pool| &pool.shares)
            .fold(BigDecimal::zero(), |total, shares| total + shares);

        Ok(UserPools {
            pools,
            tokens,
            total_invested_amount: total_invested_amount.normalized().to_string(),
        })
    }
}

fn referenced_tokens(pools: &[Pool]) -> Vec<Address> {
    pools
        .iter()
        .flat_map(|pool| {
            pool.tokens_list
                .iter()
                .chain(pool.linear_pool_tokens_map.keys())
                .copied()
                .chain(std::iter::once(pool.address))
        })
        .unique()
        .collect()
}

/// Value of the user's balance of `pool`'s liquidity token.
fn share_value(pool: &Pool, balances: &HashMap<B256, BigDecimal>) -> BigDecimal {
    let Some(balance) = balances.get(&pool.id) else {
        return BigDecimal::zero();
    };
    if pool.total_shares.is_zero() {
        return BigDecimal::zero();
    }
    &pool.total_liquidity / &pool.total_shares * balance
}

/// Runs the user pools query whenever a wallet is ready, an account is
/// connected and token lists are loaded. The query re-runs when the account or
/// chain changes.
pub fn spawn(fetcher: Arc<UserPoolsFetcher>, session: &SessionProvider) -> QueryHandle<UserPools> {
    let inputs = reactive::combine(session.subscribe(), session.subscribe_token_lists());
    reactive::spawn_query(
        "user_pools",
        inputs,
        |(session, token_lists)| {
            if *token_lists != TokenListsState::Loaded {
                return None;
            }
            session
                .connected_account()
                .map(|account| (account, session.chain_id))
        },
        move |(account, _)| {
            let fetcher = fetcher.clone();
            async move { fetcher.fetch(account).await }
        },
    )
}
