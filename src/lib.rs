// src/lib.rs

pub mod entities {
    pub mod prelude;
    pub mod protocols;
    pub mod protocol_tvl;
    pub mod protocol_tokens;
    pub mod sync_ledger;
    pub mod sync_status;
}

pub mod services {
    pub mod catalog;
    pub mod checkpoint;
    pub mod normalize;
    pub mod staleness;
    pub mod store;
    pub mod sync_engine;
    pub mod sync_status;
}

pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
