//! `SeaORM` Entity for protocols table (latest catalog summary per protocol)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "protocols")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub protocol_id: String,
    pub name: String,
    pub slug: String,
    pub symbol: Option<String>,
    pub category: Option<String>,
    /// JSON array of chain names
    #[sea_orm(column_type = "JsonBinary")]
    pub chains: Json,
    pub tvl: Option<Decimal>,
    /// JSON object chain -> current value
    #[sea_orm(column_type = "JsonBinary")]
    pub chain_tvls: Json,
    pub updated_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
