//! Contains the records exchanged with the subgraph indexer and the backend
//! gateway, shared between the data clients and the dashboard.

pub mod config;
pub mod farm;
pub mod lge;
pub mod pool;
pub mod portfolio;
pub mod prices;

pub use alloy_primitives::{Address, B256};
