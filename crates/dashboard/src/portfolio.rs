use {
    crate::{
        reactive::{self, QueryHandle},
        session::SessionProvider,
    },
    alloy_primitives::Address,
    anyhow::Result,
    clients::gateway::GatewayApi,
    model::portfolio::UserPortfolioData,
    serde::Serialize,
    std::sync::Arc,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPortfolio {
    pub current: UserPortfolioData,
    pub history: Vec<UserPortfolioData>,
}

pub async fn fetch(gateway: &dyn GatewayApi, account: Address) -> Result<UserPortfolio> {
    let (current, history) = futures::try_join!(
        gateway.user_portfolio_data(account),
        gateway.user_portfolio_historical_data(account),
    )?;
    Ok(UserPortfolio { current, history })
}

/// Runs the portfolio query for the connected account.
pub fn spawn(
    gateway: Arc<dyn GatewayApi>,
    session: &SessionProvider,
) -> QueryHandle<UserPortfolio> {
    reactive::spawn_query(
        "user_portfolio",
        session.subscribe(),
        |session| session.connected_account(),
        move |account| {
            let gateway = gateway.clone();
            async move { fetch(gateway.as_ref(), account).await }
        },
    )
}
