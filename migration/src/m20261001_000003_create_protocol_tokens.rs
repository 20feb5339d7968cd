use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProtocolTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProtocolTokens::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProtocolTokens::ProtocolId).string().not_null())
                    .col(ColumnDef::new(ProtocolTokens::Chain).string().not_null())
                    .col(ColumnDef::new(ProtocolTokens::Token).string().not_null())
                    .col(ColumnDef::new(ProtocolTokens::Timestamp).big_integer().not_null())
                    .col(ColumnDef::new(ProtocolTokens::Amount).decimal().not_null())
                    .col(ColumnDef::new(ProtocolTokens::AmountUsd).decimal().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_protocol_tokens_unique")
                    .table(ProtocolTokens::Table)
                    .col(ProtocolTokens::ProtocolId)
                    .col(ProtocolTokens::Chain)
                    .col(ProtocolTokens::Token)
                    .col(ProtocolTokens::Timestamp)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProtocolTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProtocolTokens {
    Table,
    Id,
    ProtocolId,
    Chain,
    Token,
    Timestamp,
    Amount,
    AmountUsd,
}
