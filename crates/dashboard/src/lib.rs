pub mod alerts;
pub mod arguments;
pub mod farms;
pub mod launches;
pub mod pool_decoration;
pub mod portfolio;
pub mod reactive;
pub mod session;
pub mod token_cache;
pub mod user_pools;

use {
    alerts::{Alert, AlertPriority, AlertRegistry, AlertType},
    anyhow::{Context, Result},
    clients::{
        gateway::{GatewayApi, GatewayClient},
        http_client::HttpClientFactory,
        pools_subgraph::{PoolsSubgraphApi, PoolsSubgraphClient},
    },
    reactive::{QueryHandle, QueryState},
    serde::Serialize,
    session::{SessionProvider, TokenListsState},
    std::sync::Arc,
    token_cache::TokenCache,
    user_pools::UserPoolsFetcher,
};

/// Loads the dashboard for the configured account and prints a JSON snapshot
/// of every query once they have settled.
pub async fn run(args: arguments::Arguments) -> Result<()> {
    let http_factory = HttpClientFactory::new(&args.http_client);
    let subgraph: Arc<dyn PoolsSubgraphApi> = Arc::new(match &args.subgraph_url {
        Some(url) => PoolsSubgraphClient::new(url.clone(), http_factory.create())?,
        None => PoolsSubgraphClient::for_chain(args.chain_id, http_factory.create())?,
    });
    let gateway: Arc<dyn GatewayApi> = Arc::new(GatewayClient::new(
        args.gateway_url.clone(),
        http_factory.create(),
    )?);
    let token_cache = Arc::new(TokenCache::new(gateway.clone()));
    let session = SessionProvider::new(args.chain_id);
    let alerts = AlertRegistry::global();
    let _eviction = alerts::spawn_transient_eviction(alerts, session.subscribe());

    let mut user_pools = user_pools::spawn(
        Arc::new(UserPoolsFetcher::new(subgraph, token_cache.clone())),
        &session,
    );
    let mut portfolio = portfolio::spawn(gateway.clone(), &session);
    let mut farms = farms::spawn(gateway.clone(), &session);
    let mut launches = launches::spawn(gateway.clone(), &session);

    let token_lists_loaded = match token_cache.prime().await {
        Ok(()) => {
            session.set_token_lists(TokenListsState::Loaded);
            true
        }
        Err(err) => {
            tracing::warn!(?err, "failed to load token prices");
            alerts.add_alert(
                Alert::new("token-prices", AlertType::Error, err.to_string())
                    .with_priority(AlertPriority::High),
            );
            false
        }
    };
    if let Some(account) = args.account {
        session.connect(account);
    }

    let (protocol, config) = tokio::join!(gateway.protocol_data(), gateway.config());
    let has_account = args.account.is_some();
    let settled = tokio::time::timeout(args.query_timeout, async {
        tokio::join!(
            settle(&mut user_pools, has_account && token_lists_loaded),
            settle(&mut portfolio, has_account),
            settle(&mut farms, true),
            settle(&mut launches, true),
        )
    })
    .await;
    if settled.is_err() {
        tracing::warn!(timeout = ?args.query_timeout, "not all queries settled in time");
    }

    alert_on_error(alerts, "user-pools", &user_pools.state());
    alert_on_error(alerts, "portfolio", &portfolio.state());
    alert_on_error(alerts, "farms", &farms.state());
    alert_on_error(alerts, "launches", &launches.state());
    let protocol = protocol
        .inspect_err(|err| {
            alerts.add_alert(Alert::new("protocol", AlertType::Error, format!("{err:#}")))
        })
        .ok();
    let config = config
        .inspect_err(|err| {
            alerts.add_alert(Alert::new("config", AlertType::Error, format!("{err:#}")))
        })
        .ok();

    let snapshot = Snapshot {
        session: SessionSnapshot {
            account: session.session().connected_account(),
            chain_id: args.chain_id,
        },
        user_pools: user_pools.state(),
        portfolio: portfolio.state(),
        farms: farms.state(),
        launches: launches.state(),
        protocol,
        config,
        alerts: alerts.alerts(),
        dynamic_data_loading: *token_cache.dynamic_data_loading().borrow(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("serialize snapshot")?
    );
    Ok(())
}

async fn settle<T: Clone>(query: &mut QueryHandle<T>, enabled: bool) {
    if enabled {
        query.settled().await;
    }
}

fn alert_on_error<T>(alerts: &AlertRegistry, id: &str, state: &QueryState<T>) {
    if let Some(err) = state.error() {
        alerts.add_alert(
            Alert::new(id, AlertType::Error, err).with_priority(AlertPriority::Medium),
        );
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSnapshot {
    account: Option<alloy_primitives::Address>,
    chain_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    session: SessionSnapshot,
    user_pools: QueryState<user_pools::UserPools>,
    portfolio: QueryState<portfolio::UserPortfolio>,
    farms: QueryState<Vec<farms::FarmWithUser>>,
    launches: QueryState<launches::Launches>,
    protocol: Option<model::config::ProtocolData>,
    config: Option<model::config::GatewayConfig>,
    alerts: Vec<alerts::Alert>,
    dynamic_data_loading: bool,
}
