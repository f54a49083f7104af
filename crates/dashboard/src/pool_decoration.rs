//! Derives the pool attributes consumers need for valuation and display from
//! the raw indexer data.

use {
    alloy_primitives::Address,
    bigdecimal::BigDecimal,
    model::{
        pool::{Pool, PoolToken},
        prices::TokenPrices,
    },
    std::collections::HashMap,
    thiserror::Error,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TokenRole {
    Main,
    Wrapped,
}

#[derive(Debug, Error, PartialEq)]
pub enum DecorationError {
    #[error("linear pool {pool} has no {role} token index")]
    MissingTokenIndex { pool: Address, role: TokenRole },
    #[error("linear pool {pool} {role} token index {index} is out of range for {tokens} tokens")]
    TokenIndexOutOfRange {
        pool: Address,
        role: TokenRole,
        index: usize,
        tokens: usize,
    },
}

/// Main and wrapped tokens of a linear pool.
#[derive(Clone, Debug, PartialEq)]
struct LinearPool {
    address: Address,
    main_token: Address,
    wrapped_token: Address,
}

/// Platform-wide view of all linear pools.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearPools {
    pools: Vec<LinearPool>,
    /// Every token of every linear pool, except the linear pools' own tokens.
    tokens: HashMap<Address, PoolToken>,
    main_tokens: HashMap<Address, Address>,
}

impl LinearPools {
    pub fn new(linear_pools: &[Pool]) -> Result<Self, DecorationError> {
        let mut result = Self::default();
        for pool in linear_pools {
            let main_token = linear_token(pool, TokenRole::Main, pool.main_index)?;
            let wrapped_token = linear_token(pool, TokenRole::Wrapped, pool.wrapped_index)?;

            for token in pool.tokens.iter().filter(|token| token.address != pool.address) {
                result.tokens.insert(token.address, token.clone());
            }
            result.main_tokens.insert(pool.address, main_token);
            result.pools.push(LinearPool {
                address: pool.address,
                main_token,
                wrapped_token,
            });
        }
        Ok(result)
    }

    fn references(&self, pool: &Pool) -> bool {
        self.pools
            .iter()
            .any(|linear| pool.tokens_list.contains(&linear.address))
    }
}

fn linear_token(
    pool: &Pool,
    role: TokenRole,
    index: Option<usize>,
) -> Result<Address, DecorationError> {
    let index = index.ok_or(DecorationError::MissingTokenIndex {
        pool: pool.address,
        role,
    })?;
    pool.tokens_list
        .get(index)
        .copied()
        .ok_or(DecorationError::TokenIndexOutOfRange {
            pool: pool.address,
            role,
            index,
            tokens: pool.tokens_list.len(),
        })
}

/// Removes a stable phantom pool's pre-minted liquidity token from its token
/// list. Other pools are left untouched.
pub fn remove_pre_minted_bpt(mut pool: Pool) -> Pool {
    if pool.pool_type.is_stable_phantom() {
        let own_address = pool.derived_address();
        pool.tokens_list.retain(|token| *token != own_address);
    }
    pool
}

/// Records the main and wrapped tokens of every linear pool `pool` holds, at
/// the position the linear pool's token has in `pool`'s token list, and
/// attaches the platform-wide linear pool maps.
///
/// Linear pools that `pool` does not hold are skipped.
pub fn apply_linear_pool_attributes(mut pool: Pool, linear_pools: &LinearPools) -> Pool {
    if !linear_pools.references(&pool) {
        return pool;
    }

    pool.main_tokens = vec![None; pool.tokens_list.len()];
    pool.wrapped_tokens = vec![None; pool.tokens_list.len()];
    for linear in &linear_pools.pools {
        let Some(index) = pool
            .tokens_list
            .iter()
            .position(|token| *token == linear.address)
        else {
            continue;
        };
        pool.main_tokens[index] = Some(linear.main_token);
        pool.wrapped_tokens[index] = Some(linear.wrapped_token);
    }
    pool.linear_pool_tokens_map = linear_pools.tokens.clone();
    pool.linear_pool_to_main_token_map = linear_pools.main_tokens.clone();
    pool
}

/// Runs the full decoration pipeline over `pools`.
pub fn decorate_pools(
    pools: Vec<Pool>,
    linear_pools: &[Pool],
) -> Result<Vec<Pool>, DecorationError> {
    let linear_pools = LinearPools::new(linear_pools)?;
    Ok(pools
        .into_iter()
        .map(remove_pre_minted_bpt)
        .map(|pool| apply_linear_pool_attributes(pool, &linear_pools))
        .collect())
}

/// Recomputes the total liquidity of pools from token prices.
///
/// Linear pool tokens are valued at the price of their main token. A pool
/// keeps the indexer's total liquidity unless every visible token is priced.
pub fn decorate_values(pools: Vec<Pool>, prices: &TokenPrices) -> Vec<Pool> {
    pools
        .into_iter()
        .map(|mut pool| {
            if let Some(total_liquidity) = total_liquidity(&pool, prices) {
                pool.total_liquidity = total_liquidity;
            } else {
                tracing::trace!(pool = %pool.address, "keeping indexer total liquidity");
            }
            pool
        })
        .collect()
}

fn total_liquidity(pool: &Pool, prices: &TokenPrices) -> Option<BigDecimal> {
    let price_of = |token: &Address| {
        prices.get(token).or_else(|| {
            pool.linear_pool_to_main_token_map
                .get(token)
                .and_then(|main_token| prices.get(main_token))
        })
    };

    let visible = pool
        .tokens
        .iter()
        .filter(|token| pool.tokens_list.contains(&token.address))
        .collect::<Vec<_>>();
    if visible.is_empty() {
        return None;
    }
    visible
        .into_iter()
        .map(|token| price_of(&token.address).map(|price| &token.balance * price))
        .sum()
}
