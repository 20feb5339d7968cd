use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProtocolTvl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProtocolTvl::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProtocolTvl::ProtocolId).string().not_null())
                    .col(ColumnDef::new(ProtocolTvl::Chain).string().not_null())
                    .col(ColumnDef::new(ProtocolTvl::Timestamp).big_integer().not_null())
                    .col(ColumnDef::new(ProtocolTvl::Tvl).decimal().not_null())
                    .to_owned(),
            )
            .await?;

        // Unique constraint: one value per protocol per chain per sample
        manager
            .create_index(
                Index::create()
                    .name("idx_protocol_tvl_unique")
                    .table(ProtocolTvl::Table)
                    .col(ProtocolTvl::ProtocolId)
                    .col(ProtocolTvl::Chain)
                    .col(ProtocolTvl::Timestamp)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProtocolTvl::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProtocolTvl {
    Table,
    Id,
    ProtocolId,
    Chain,
    Timestamp,
    Tvl,
}
