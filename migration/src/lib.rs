pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_protocols;
mod m20261001_000002_create_protocol_tvl;
mod m20261001_000003_create_protocol_tokens;
mod m20261001_000004_create_sync_ledger;
mod m20261001_000005_create_sync_status;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_protocols::Migration),
            Box::new(m20261001_000002_create_protocol_tvl::Migration),
            Box::new(m20261001_000003_create_protocol_tokens::Migration),
            Box::new(m20261001_000004_create_sync_ledger::Migration),
            Box::new(m20261001_000005_create_sync_status::Migration),
        ]
    }
}
