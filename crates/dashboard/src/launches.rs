//! Liquidity generation events grouped by their status.

use {
    crate::{
        reactive::{self, QueryHandle},
        session::SessionProvider,
    },
    anyhow::Result,
    chrono::{DateTime, Utc},
    clients::gateway::GatewayApi,
    model::lge::{Lge, LgeStatus},
    serde::Serialize,
    std::sync::Arc,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Launches {
    pub upcoming: Vec<Lge>,
    pub active: Vec<Lge>,
    pub ended: Vec<Lge>,
}

impl Launches {
    pub fn classify(lges: Vec<Lge>, now: DateTime<Utc>) -> Self {
        let mut launches = Self::default();
        for lge in lges {
            match lge.status_at(now.timestamp()) {
                LgeStatus::Upcoming => launches.upcoming.push(lge),
                LgeStatus::Active => launches.active.push(lge),
                LgeStatus::Ended => launches.ended.push(lge),
            }
        }
        launches
    }
}

pub async fn fetch(gateway: &dyn GatewayApi) -> Result<Launches> {
    let lges = gateway.lges().await?;
    Ok(Launches::classify(lges, Utc::now()))
}

/// Runs the launches query. It re-runs when the chain changes.
pub fn spawn(gateway: Arc<dyn GatewayApi>, session: &SessionProvider) -> QueryHandle<Launches> {
    reactive::spawn_query(
        "launches",
        session.subscribe(),
        |session| Some(session.chain_id),
        move |_| {
            let gateway = gateway.clone();
            async move { fetch(gateway.as_ref()).await }
        },
    )
}
