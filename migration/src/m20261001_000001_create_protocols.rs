use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Protocols::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Protocols::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Protocols::ProtocolId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Protocols::Name).string().not_null())
                    .col(ColumnDef::new(Protocols::Slug).string().not_null())
                    .col(ColumnDef::new(Protocols::Symbol).string().null())
                    .col(ColumnDef::new(Protocols::Category).string().null())
                    .col(ColumnDef::new(Protocols::Chains).json_binary().not_null())
                    .col(ColumnDef::new(Protocols::Tvl).decimal().null())
                    .col(ColumnDef::new(Protocols::ChainTvls).json_binary().not_null())
                    .col(
                        ColumnDef::new(Protocols::UpdatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // One summary per upstream identifier
        manager
            .create_index(
                Index::create()
                    .name("idx_protocols_protocol_id_unique")
                    .table(Protocols::Table)
                    .col(Protocols::ProtocolId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Protocols::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Protocols {
    Table,
    Id,
    ProtocolId,
    Name,
    Slug,
    Symbol,
    Category,
    Chains,
    Tvl,
    ChainTvls,
    UpdatedAt,
}
