use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One checkpoint document per ledger name; entries and cursor
        // live in the same row.
        manager
            .create_table(
                Table::create()
                    .table(SyncLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncLedger::Id)
                            .string_len(100)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncLedger::Entries).json_binary().not_null())
                    .col(
                        ColumnDef::new(SyncLedger::Cursor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncLedger::LastRunAt)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncLedger::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SyncLedger {
    Table,
    Id,
    Entries,
    Cursor,
    LastRunAt,
}
