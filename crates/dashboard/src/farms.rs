use {
    crate::{
        reactive::{self, QueryHandle},
        session::SessionProvider,
    },
    alloy_primitives::Address,
    anyhow::Result,
    clients::gateway::GatewayApi,
    model::farm::{Farm, FarmUser},
    serde::Serialize,
    std::{collections::HashMap, sync::Arc},
};

/// A farm together with the connected user's position in it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmWithUser {
    #[serde(flatten)]
    pub farm: Farm,
    pub user: Option<FarmUser>,
}

pub async fn fetch(
    gateway: &dyn GatewayApi,
    account: Option<Address>,
) -> Result<Vec<FarmWithUser>> {
    let users = async {
        match account {
            Some(account) => gateway.farm_users(account).await,
            None => Ok(Vec::new()),
        }
    };
    let (farms, users) = futures::try_join!(gateway.farms(), users)?;

    let mut users = users
        .into_iter()
        .map(|user| (user.farm_id.clone(), user))
        .collect::<HashMap<_, _>>();
    Ok(farms
        .into_iter()
        .map(|farm| FarmWithUser {
            user: users.remove(&farm.id),
            farm,
        })
        .collect())
}

/// Runs the farms query. It is always enabled and re-runs when the connected
/// account changes.
pub fn spawn(
    gateway: Arc<dyn GatewayApi>,
    session: &SessionProvider,
) -> QueryHandle<Vec<FarmWithUser>> {
    reactive::spawn_query(
        "farms",
        session.subscribe(),
        |session| Some(session.connected_account()),
        move |account| {
            let gateway = gateway.clone();
            async move { fetch(gateway.as_ref(), account).await }
        },
    )
}
