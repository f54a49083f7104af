use {
    alloy_primitives::Address,
    clap::Parser,
    clients::http_client,
    std::{
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(Parser)]
pub struct Arguments {
    #[clap(flatten)]
    pub http_client: http_client::Arguments,

    #[clap(long, env, default_value = "warn,dashboard=debug,clients=debug")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,

    /// The chain the dashboard shows data for.
    #[clap(long, env, default_value = "250")]
    pub chain_id: u64,

    /// Overrides the pools subgraph URL derived from the chain ID.
    #[clap(long, env)]
    pub subgraph_url: Option<Url>,

    /// URL of the backend GraphQL gateway.
    #[clap(long, env)]
    pub gateway_url: Url,

    /// Account to load user data for. Without it only public data is
    /// loaded.
    #[clap(long, env)]
    pub account: Option<Address>,

    /// How long to wait for all queries to settle.
    #[clap(
        long,
        env,
        default_value = "1m",
        value_parser = humantime::parse_duration,
    )]
    pub query_timeout: Duration,
}

impl Arguments {
    pub fn observe_config(&self) -> observe::Config {
        observe::Config::new(
            &self.log_filter,
            self.log_stderr_threshold.into_level(),
            self.use_json_logs,
        )
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            http_client,
            log_filter,
            log_stderr_threshold,
            use_json_logs,
            chain_id,
            subgraph_url,
            gateway_url,
            account,
            query_timeout,
        } = self;

        write!(f, "{http_client}")?;
        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        writeln!(f, "chain_id: {chain_id}")?;
        writeln!(f, "subgraph_url: {subgraph_url:?}")?;
        writeln!(f, "gateway_url: {gateway_url}")?;
        writeln!(f, "account: {account:?}")?;
        writeln!(f, "query_timeout: {query_timeout:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::str::FromStr};

    #[test]
    fn parses_defaults() {
        let args = Arguments::try_parse_from([
            "dashboard",
            "--gateway-url",
            "https://gateway.example.com/graphql",
            "--account",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "--query-timeout",
            "90s",
        ])
        .unwrap();

        assert_eq!(args.chain_id, 250);
        assert_eq!(args.subgraph_url, None);
        assert_eq!(
            args.account,
            Some(Address::from_str("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap())
        );
        assert_eq!(args.query_timeout, Duration::from_secs(90));
        assert_eq!(args.http_client.http_timeout, Duration::from_secs(10));
        assert!(args.to_string().contains("gateway_url: https://gateway.example.com/graphql"));
    }
}
