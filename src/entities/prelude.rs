//! `SeaORM` Entity prelude

pub use super::protocol_tokens::Entity as ProtocolTokens;
pub use super::protocol_tvl::Entity as ProtocolTvl;
pub use super::protocols::Entity as Protocols;
pub use super::sync_ledger::Entity as SyncLedger;
pub use super::sync_status::Entity as SyncStatus;
