//! Process-wide token price cache.
//!
//! Consumers inject the token addresses they need and await the returned
//! future, which resolves once prices for those tokens are loaded. Concurrent
//! injections of the same tokens share one request to the gateway.

use {
    alloy_primitives::Address,
    async_trait::async_trait,
    clients::gateway::GatewayApi,
    futures::{
        FutureExt,
        future::{BoxFuture, Shared},
    },
    model::prices::TokenPrices,
    std::{
        collections::{HashMap, HashSet},
        sync::{
            Arc,
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    },
    thiserror::Error,
    tokio::sync::watch,
};

#[derive(Clone, Debug, Error)]
#[error("error loading token prices: {0}")]
pub struct Error(String);

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait TokenPriceLoading: Send + Sync {
    /// Registers tokens with the cache and resolves once their prices are
    /// loaded.
    async fn inject_tokens(&self, addresses: Vec<Address>) -> Result<(), Error>;

    /// Snapshot of all loaded prices.
    fn prices(&self) -> TokenPrices;
}

type SharedPrices = Shared<BoxFuture<'static, Result<Arc<TokenPrices>, Error>>>;

#[derive(Default)]
struct Inner {
    prices: TokenPrices,
    /// Tokens a load completed for, whether or not the gateway knew a price.
    loaded: HashSet<Address>,
    pending: HashMap<Address, SharedPrices>,
}

pub struct TokenCache {
    gateway: Arc<dyn GatewayApi>,
    inner: Mutex<Inner>,
    in_flight: AtomicUsize,
    loading: watch::Sender<bool>,
}

impl TokenCache {
    pub fn new(gateway: Arc<dyn GatewayApi>) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            gateway,
            inner: Default::default(),
            in_flight: AtomicUsize::new(0),
            loading,
        }
    }

    /// Signal that is `true` while any price load is in flight.
    pub fn dynamic_data_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Loads all prices the gateway knows about.
    pub async fn prime(&self) -> Result<(), Error> {
        let prices = {
            let _loading = self.start_loading();
            self.gateway
                .latest_token_prices()
                .await
                .map_err(|err| Error(format!("{err:#}")))?
        };
        let mut inner = self.inner.lock().unwrap();
        inner.loaded.extend(prices.keys().copied());
        inner.prices.extend(prices);
        tracing::debug!(tokens = inner.prices.len(), "primed token price cache");
        Ok(())
    }

    fn start_loading(&self) -> scopeguard::ScopeGuard<(), impl FnOnce(())> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.loading.send_replace(true);
        }
        scopeguard::guard((), |()| {
            if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.loading.send_replace(false);
            }
        })
    }

    /// Returns the loads the given addresses wait on, starting a new one for
    /// addresses neither loaded nor pending.
    fn loads_for(&self, addresses: &[Address]) -> Vec<(SharedPrices, Vec<Address>)> {
        let mut inner = self.inner.lock().unwrap();

        let missing = addresses
            .iter()
            .filter(|address| {
                !inner.loaded.contains(*address) && !inner.pending.contains_key(*address)
            })
            .copied()
            .collect::<HashSet<_>>();
        if !missing.is_empty() {
            tracing::debug!(tokens = missing.len(), "loading token prices");
            let gateway = self.gateway.clone();
            let load = async move {
                gateway
                    .latest_token_prices()
                    .await
                    .map(Arc::new)
                    .map_err(|err| Error(format!("{err:#}")))
            }
            .boxed()
            .shared();
            for address in missing {
                inner.pending.insert(address, load.clone());
            }
        }

        let mut loads: Vec<(SharedPrices, Vec<Address>)> = Vec::new();
        for address in addresses {
            let Some(load) = inner.pending.get(address) else {
                continue;
            };
            match loads.iter_mut().find(|(other, _)| other.ptr_eq(load)) {
                Some((_, tokens)) => tokens.push(*address),
                None => loads.push((load.clone(), vec![*address])),
            }
        }
        loads
    }

    fn complete(
        &self,
        load: &SharedPrices,
        tokens: &[Address],
        result: &Result<Arc<TokenPrices>, Error>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        for token in tokens {
            if inner
                .pending
                .get(token)
                .is_some_and(|pending| pending.ptr_eq(load))
            {
                inner.pending.remove(token);
            }
        }
        if let Ok(prices) = result {
            for token in tokens {
                if let Some(price) = prices.get(token) {
                    inner.prices.insert(*token, price.clone());
                } else {
                    tracing::debug!(%token, "no price available");
                }
                inner.loaded.insert(*token);
            }
        }
    }
}

#[async_trait]
impl TokenPriceLoading for TokenCache {
    async fn inject_tokens(&self, addresses: Vec<Address>) -> Result<(), Error> {
        let loads = self.loads_for(&addresses);
        if loads.is_empty() {
            return Ok(());
        }

        let _loading = self.start_loading();
        let results =
            futures::future::join_all(loads.iter().map(|(load, _)| load.clone())).await;

        let mut outcome = Ok(());
        for ((load, tokens), result) in loads.iter().zip(&results) {
            self.complete(load, tokens, result);
            if let Err(err) = result {
                outcome = Err(err.clone());
            }
        }
        outcome
    }

    fn prices(&self) -> TokenPrices {
        self.inner.lock().unwrap().prices.clone()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        bigdecimal::BigDecimal,
        clients::gateway::MockGatewayApi,
        maplit::hashmap,
        std::str::FromStr,
    };

    fn price(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn concurrent_injections_share_one_request() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let c = Address::repeat_byte(0xcc);

        let mut gateway = MockGatewayApi::new();
        gateway
            .expect_latest_token_prices()
            .times(2)
            .returning(move || Ok(hashmap! { a => price("1.5"), b => price("2") }));
        let cache = TokenCache::new(Arc::new(gateway));

        let (first, second) = futures::join!(
            cache.inject_tokens(vec![a, b]),
            cache.inject_tokens(vec![b, a]),
        );
        first.unwrap();
        second.unwrap();
        assert_eq!(cache.prices(), hashmap! { a => price("1.5"), b => price("2") });

        // A new token needs a new request, even if the gateway has no price
        // for it.
        cache.inject_tokens(vec![a, c]).await.unwrap();
        assert!(!cache.prices().contains_key(&c));

        // Everything is loaded now.
        cache.inject_tokens(vec![a, b, c]).await.unwrap();
        assert!(!*cache.dynamic_data_loading().borrow());
    }

    #[tokio::test]
    async fn failed_loads_are_retried() {
        let a = Address::repeat_byte(0xaa);

        let mut gateway = MockGatewayApi::new();
        let mut sequence = mockall::Sequence::new();
        gateway
            .expect_latest_token_prices()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Err(anyhow::anyhow!("gateway down")));
        gateway
            .expect_latest_token_prices()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move || Ok(hashmap! { a => price("3") }));
        let cache = TokenCache::new(Arc::new(gateway));

        let err = cache.inject_tokens(vec![a]).await.unwrap_err();
        assert!(err.to_string().contains("gateway down"));
        assert!(cache.prices().is_empty());

        cache.inject_tokens(vec![a]).await.unwrap();
        assert_eq!(cache.prices(), hashmap! { a => price("3") });
    }

    #[tokio::test]
    async fn prime_loads_everything() {
        let a = Address::repeat_byte(0xaa);

        let mut gateway = MockGatewayApi::new();
        gateway
            .expect_latest_token_prices()
            .times(1)
            .returning(move || Ok(hashmap! { a => price("4") }));
        let cache = TokenCache::new(Arc::new(gateway));

        cache.prime().await.unwrap();
        cache.inject_tokens(vec![a]).await.unwrap();
        assert_eq!(cache.prices()[&a], price("4"));
    }
}
