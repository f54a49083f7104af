#[macro_use]
pub mod macros;

pub mod gateway;
pub mod graphql;
pub mod http_client;
pub mod pools_subgraph;
